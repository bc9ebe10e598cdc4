//! BOSH CLI deployer for undeploy
//!
//! This crate implements the `Deployer` trait by shelling out to the `bosh`
//! CLI.
//!
//! # Requirements
//!
//! - `bosh` CLI v6+ on the `PATH` (or configured explicitly)
//! - The director manifest used at creation time, for `delete-env`
//!
//! # Example
//!
//! ```ignore
//! use undeploy_bosh::BoshCli;
//!
//! let bosh = BoshCli::new("director.yml").with_deployment("concourse");
//! ```

pub mod cli;
pub mod error;
pub mod vars;

pub use cli::BoshCli;
pub use error::{BoshError, Result};
