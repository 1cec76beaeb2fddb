#![allow(unused_assignments)] // thiserror/miette proc macros trigger false positives

pub mod address;
pub mod backend;
pub mod cli;
pub mod config;
pub mod description;
pub mod domain_xml;
pub mod error;
pub mod inventory;
pub mod lifecycle;
pub mod network_xml;
pub mod paths;
pub mod provision;
pub mod ssh;
pub mod template;
