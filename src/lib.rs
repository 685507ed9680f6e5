//! # Fabricgen - Fabric topology generation for declarative configuration pipelines
//!
//! This library implements a KRM function that expands a network-fabric
//! `Definition` and a set of reusable `Template`s into concrete `Node` and
//! `Link` resources, plus the management IP allocation requests every node
//! needs.
//!
//! ## Overview
//!
//! The function runs as one stage of a configuration pipeline. It reads a
//! `ResourceList`, derives new resources from the items it recognizes, and
//! writes the list back out. It keeps no state between invocations.
//!
//! ## Architecture
//!
//! - `resource`: object metadata, the `ResourceList` envelope and the input bundle
//! - `topology`: template classification and fabric composition
//! - `ip`: allocation request construction and naming
//! - `orchestrator`: one run, from input bundle to emitted resources
//! - `results`: error collection and result reporting
//! - `config` / `config_loader`: function configuration and ResourceList I/O
//! - `utils`: name and value validation
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use fabricgen::{config_loader, orchestrator, resource::ResourceBundle};
//! use std::path::Path;
//!
//! let list = config_loader::load_resource_list(Path::new("resources.yaml"))?;
//! let config = config_loader::function_config(&list)?;
//! let run = orchestrator::run(&ResourceBundle::from_items(&list.items), &config);
//! println!("generated {} resources, success={}", run.outputs.len(), run.success);
//! # Ok::<(), color_eyre::Report>(())
//! ```
//!
//! ## Input Format
//!
//! ```yaml
//! apiVersion: config.kubernetes.io/v1
//! kind: ResourceList
//! items:
//!   - apiVersion: topo.yndd.io/v1alpha1
//!     kind: Definition
//!     metadata: {name: dc1, namespace: default}
//!     spec:
//!       properties:
//!         location: {latitude: "52.37", longitude: "4.89"}
//!   - apiVersion: topo.yndd.io/v1alpha1
//!     kind: Template
//!     metadata: {name: pod, namespace: default}
//!     spec:
//!       properties:
//!         fabric:
//!           tier2: {num: 2}
//!           tier1: {num: 4}
//! ```
//!
//! ## Error Handling
//!
//! Problems found while processing inputs are collected as
//! `results::RunError` values and reported in `ResourceList.results`. The
//! binary uses `color_eyre` for failures reading or writing the list itself.

pub mod config;
pub mod config_loader;
pub mod resource;
pub mod topology;
pub mod ip;
pub mod results;
pub mod orchestrator;
pub mod utils;
