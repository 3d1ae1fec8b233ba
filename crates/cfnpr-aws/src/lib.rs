mod client;
mod convert;

pub use client::{AwsChangesets, RoleNames};
