// src/models/mod.rs

pub mod user;
pub mod session;
pub mod group;
pub mod permission;
pub mod project;
pub mod project_member;
pub mod milestone;
pub mod task;
pub mod dependency;
pub mod label;
pub mod release;
pub mod file_attachment;
