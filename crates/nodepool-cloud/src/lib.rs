//! nodepool-cloud — the cloud resize gateway capability.
//!
//! A node group is backed by one provider-side resize target (an AWS
//! autoscaling group, a GCE managed instance group, ...). The scale-up
//! path only needs three things from it: the current desired size, the
//! provider's maximum, and a way to ask for more nodes. Requests are
//! fire-and-forget; new nodes show up in a later scan cycle.

pub mod error;
pub mod gateway;

pub use error::{CloudError, CloudResult};
pub use gateway::{CloudResizeGateway, InMemoryGateway};
