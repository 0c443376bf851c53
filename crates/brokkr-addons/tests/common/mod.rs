//! Shared test infrastructure for the addon engine suites:
//! - a package builder producing real Generation 2 archives
//! - a panel tree fixture with routers, layouts, and the frontend route table
//! - a spy process gateway that counts external calls

#![allow(dead_code)]

pub mod builders;
pub mod fixtures;
pub mod mocks;

pub use builders::*;
pub use fixtures::*;
pub use mocks::*;

use brokkr_addons::{PendingTransaction, TransactionFlow, TransactionLog};

pub fn expect_done(flow: TransactionFlow) -> TransactionLog {
    match flow {
        TransactionFlow::Done(log) => log,
        TransactionFlow::Pending(pending) => {
            panic!("unexpected suspension on {}", pending.manual.route.name)
        }
    }
}

pub fn expect_pending(flow: TransactionFlow) -> PendingTransaction {
    match flow {
        TransactionFlow::Done(_) => panic!("expected a suspension"),
        TransactionFlow::Pending(pending) => pending,
    }
}
