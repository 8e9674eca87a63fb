//! FD variable identity (C3).
use crate::term::VarId;

/// An FD variable: identity plus an optional debug name. Identity is a
/// [`VarId`] drawn from the same monotonic counter used by relational logic
/// variables, so a variable introduced by `fresh()` can be registered
/// directly with a [`crate::fd::model::Model`].
pub type FdVar = VarId;

#[derive(Clone, Debug)]
pub struct FdVarInfo {
    pub id: FdVar,
    pub name: Option<&'static str>,
}

impl FdVarInfo {
    pub fn new(id: FdVar, name: Option<&'static str>) -> FdVarInfo {
        FdVarInfo { id, name }
    }
}
