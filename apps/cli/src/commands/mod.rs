//! Command implementations for the ACE CLI.

pub mod playbook;
