//! # API Route Modules
//!
//! | Prefix               | Module            |
//! |----------------------|-------------------|
//! | `/v1/messages/*`     | [`messages`]      |
//! | `/v1/eligibility/*`  | [`eligibility`]   |
//! | `/v1/roots`          | [`roots`]         |

pub mod eligibility;
pub mod messages;
pub mod roots;
