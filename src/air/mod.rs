// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The AIR node (component C5): tagged IR form of one operation, before
//! solidification into an [`crate::queue::AvmcQueue`].
//!
//! Lowering (source → AIR) is an external collaborator per §1; this crate
//! only owns the AIR shape and the four things every alternative must be
//! able to answer: is it a constant, is it a terminator, how does it rebind
//! under closure capture, and how does it solidify into the queue.

pub mod rebind;
pub mod solidify;
pub mod xop;

use std::rc::Rc;

use crate::sloc::SourceLocation;
use crate::status::PtcAware;
use crate::value::Value;
use xop::Xop;

/// `simple_status` payload (§4.2 category 1).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimpleStatusKind {
    Break,
    Continue,
    ReturnVoid,
}

/// A `switch` clause discriminant (§4.2 category 3).
#[derive(Clone, Debug)]
pub enum SwitchClause {
    CaseEqual(Box<AirNode>),
    CaseBetween {
        lower: Box<AirNode>,
        lower_closed: bool,
        upper: Box<AirNode>,
        upper_closed: bool,
    },
    Default,
}

/// One `switch` arm.
#[derive(Clone, Debug)]
pub struct SwitchArm {
    pub clause: SwitchClause,
    pub body: Vec<AirNode>,
}

/// One `if` arm (`if`/`else if`/`else`).
#[derive(Clone, Debug)]
pub struct IfBranch {
    pub condition: Option<Box<AirNode>>,
    pub body: Vec<AirNode>,
}

/// Function-definition options carried by `define_function` (visibility,
/// variadic-ness — kept abstract since the concrete option set is part of
/// the out-of-scope value model).
#[derive(Clone, Copy, Debug, Default)]
pub struct FunctionOpts {
    pub is_variadic: bool,
}

/// Tagged sum of Asteria IR operations (§4.2). Categories mirror the
/// spec's six groupings.
#[derive(Clone, Debug)]
pub enum AirNode {
    // --- 1. Control-flow scaffolding ---
    ClearStack,
    AltClearStack,
    SimpleStatus(SimpleStatusKind),
    ExecuteBlock(Vec<AirNode>),
    SingleStepTrap(SourceLocation),
    ReturnStatement {
        sloc: SourceLocation,
        by_ref: bool,
        is_void: bool,
    },
    ReturnStatementBi32 {
        sloc: SourceLocation,
        value: i32,
    },

    // --- 2. Declarations and references ---
    DeclareVariable(Rc<str>),
    InitializeVariable(Rc<str>),
    DefineNullVariable(Rc<str>),
    DeclareReference(Rc<str>),
    InitializeReference(Rc<str>),
    PushGlobalReference(Rc<str>),
    PushLocalReference { depth: u32, name: Rc<str> },
    PushBoundReference(usize),

    // --- 3. Structured statements ---
    If(Vec<IfBranch>),
    Switch(Vec<SwitchArm>),
    DoWhile {
        body: Vec<AirNode>,
        condition: Box<AirNode>,
    },
    While {
        condition: Box<AirNode>,
        body: Vec<AirNode>,
    },
    For {
        init: Vec<AirNode>,
        condition: Option<Box<AirNode>>,
        step: Vec<AirNode>,
        body: Vec<AirNode>,
    },
    ForEach {
        key_name: Option<Rc<str>>,
        value_name: Rc<str>,
        iterable: Box<AirNode>,
        body: Vec<AirNode>,
    },
    TryCatch {
        try_body: Vec<AirNode>,
        catch_name: Rc<str>,
        catch_body: Vec<AirNode>,
    },

    // --- 4. Expression bodies ---
    BranchExpression {
        condition: Box<AirNode>,
        if_true: Box<AirNode>,
        if_false: Box<AirNode>,
    },
    CoalesceExpression {
        lhs: Box<AirNode>,
        rhs: Box<AirNode>,
    },
    CatchExpression(Box<AirNode>),
    CheckArgument(u32),
    CheckNull,
    ApplyOperator {
        xop: Xop,
        assign: bool,
    },
    ApplyOperatorBi32 {
        xop: Xop,
        assign: bool,
        int_rhs: i32,
    },
    MemberAccess(Rc<str>),

    // --- 5. Calls and composite construction ---
    FunctionCall {
        sloc: SourceLocation,
        nargs: u32,
        ptc_aware: PtcAware,
    },
    AltFunctionCall {
        sloc: SourceLocation,
        nargs: u32,
    },
    VariadicCall(SourceLocation),
    ImportCall {
        sloc: SourceLocation,
        path: Rc<str>,
    },
    PushUnnamedArray(u32),
    PushUnnamedObject(Vec<Rc<str>>),
    UnpackArray(u32),
    UnpackObject(Vec<Rc<str>>),
    DefineFunction {
        opts: FunctionOpts,
        sloc: SourceLocation,
        name: Rc<str>,
        params: Vec<Rc<str>>,
        body: Vec<AirNode>,
    },
    DeferExpression {
        sloc: SourceLocation,
        body: Vec<AirNode>,
    },

    // --- 6. Terminators and side effects ---
    ThrowStatement(SourceLocation),
    AssertStatement {
        sloc: SourceLocation,
        msg: Rc<str>,
    },
    PushConstant(Value),
}

impl AirNode {
    /// Constant-value analysis (§4.2): only `push_constant` answers yes.
    #[must_use]
    pub fn constant_value(&self) -> Option<&Value> {
        match self {
            Self::PushConstant(v) => Some(v),
            _ => None,
        }
    }

    /// Terminator analysis (§4.2, §8): does this node unconditionally
    /// transfer control out of the enclosing block?
    #[must_use]
    pub fn is_terminator(&self) -> bool {
        match self {
            Self::ThrowStatement(_)
            | Self::ReturnStatement { .. }
            | Self::ReturnStatementBi32 { .. } => true,
            Self::If(branches) => {
                // Exhaustive (has an unconditional else) and every arm's
                // body ends in a terminator.
                let has_else = branches.iter().any(|b| b.condition.is_none());
                has_else && branches.iter().all(|b| block_is_terminator(&b.body))
            }
            Self::Switch(arms) => {
                let has_default = arms
                    .iter()
                    .any(|a| matches!(a.clause, SwitchClause::Default));
                has_default && arms.iter().all(|a| block_is_terminator(&a.body))
            }
            Self::ExecuteBlock(body) => block_is_terminator(body),
            _ => false,
        }
    }
}

/// A block (sequence of nodes) is a terminator iff its last node is one,
/// dead code after it having already been eliminated by lowering.
#[must_use]
pub fn block_is_terminator(body: &[AirNode]) -> bool {
    body.last().is_some_and(AirNode::is_terminator)
}
