pub(super) mod attach;
pub(super) mod copy;
pub(super) mod list;
pub(super) mod migrate;
pub(super) mod remap;
pub(super) mod show;
pub(super) mod sync;
pub(super) mod verify;
