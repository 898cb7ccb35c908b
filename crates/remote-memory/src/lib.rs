mod store;

pub use store::{
    Call, FailKind, Failures, MemoryTestManagement, StoredAttachment, StoredResult, StoredRun,
    test_point,
};
