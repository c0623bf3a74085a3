//! Per-kind IR entity ids.
//!
//! Every IR kind gets its own id newtype. Numeric values overlap freely
//! across kinds; the type system keeps a `VarId` from ever being used
//! where a `BlockId` is expected, which is the whole point.

use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Id of a [`Var`](crate::entities::Var).
    VarId
);
define_id!(
    /// Id of a [`Vars`](crate::entities::Vars) group.
    VarsId
);
define_id!(
    /// Id of a [`FuncInvocation`](crate::entities::FuncInvocation).
    FuncInvocationId
);
define_id!(
    /// Id of an [`Assign`](crate::entities::Assign).
    AssignId
);
define_id!(
    /// Id of a [`Block`](crate::entities::Block).
    BlockId
);
define_id!(
    /// Id of an [`If`](crate::entities::If).
    IfId
);
define_id!(
    /// Id of a [`For`](crate::entities::For).
    ForId
);
define_id!(
    /// Id of a [`While`](crate::entities::While).
    WhileId
);
define_id!(
    /// Id of a [`DoWhile`](crate::entities::DoWhile).
    DoId
);
define_id!(
    /// Id of an [`OutputActivation`](crate::entities::OutputActivation).
    OutputActivationId
);
define_id!(
    /// Id of a [`ReturnOutputActivation`](crate::entities::ReturnOutputActivation).
    ReturnOutputActivationId
);
define_id!(
    /// Id of an [`InputBinding`](crate::entities::InputBinding).
    InputBindingId
);
define_id!(
    /// Id of a [`Symbol`](crate::entities::Symbol).
    SymbolId
);
define_id!(
    /// Id of an [`IrType`](crate::entities::IrType).
    IrTypeId
);
define_id!(
    /// Id of a [`HeaderFile`](crate::entities::HeaderFile).
    HeaderFileId
);
define_id!(
    /// Id of a [`Lib`](crate::entities::Lib).
    LibId
);
define_id!(
    /// Id of an interned [`Statement`](crate::entities::Statement).
    StatementId
);
