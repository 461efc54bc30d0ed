// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dashboard records and the SQL statements they queue.
//!
//! Records are updated from partial patches (fields absent from a patch are
//! left alone) and render themselves as complete SQL statements that can be
//! handed to a [`WriteQueue`](opsdash_queue::WriteQueue).

pub mod record;
pub mod service_queue;
pub mod sql;
pub mod view;

pub use record::QueuedRecord;
pub use service_queue::{ServiceQueue, ServiceQueuePatch};
pub use view::{View, ViewPatch};
