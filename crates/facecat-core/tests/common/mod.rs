#![allow(dead_code)]

pub mod face_server;
pub mod fake_service;
