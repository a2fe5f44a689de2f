//! Chain-agnostic programmable transaction.
//!
//! Mirrors the shape of a Sui programmable transaction block: a list of
//! inputs and an ordered list of commands whose results later commands can
//! reference. The Sui adapter lowers it one-to-one.

use crate::types::{Address, ObjectId};

/// BCS-encodable pure input value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PureArg {
    U64(u64),
    Address(Address),
    /// An object id passed by value (`ID` in Move).
    Id(ObjectId),
}

/// Transaction input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Pure(PureArg),
    SharedObject {
        id: ObjectId,
        initial_shared_version: u64,
        mutable: bool,
    },
}

/// Reference to a value available to a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Argument {
    /// The sponsor's gas coin.
    GasCoin,
    Input(u16),
    Result(u16),
    NestedResult(u16, u16),
}

/// A Move function call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveCall {
    pub package: ObjectId,
    pub module: String,
    pub function: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<Argument>,
}

impl MoveCall {
    /// `package::module::function`.
    pub fn target(&self) -> String {
        format!("{}::{}::{}", self.package, self.module, self.function)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SplitCoins {
        coin: Argument,
        amounts: Vec<Argument>,
    },
    MoveCall(MoveCall),
    TransferObjects {
        objects: Vec<Argument>,
        recipient: Argument,
    },
}

/// Incremental builder handing out [`Argument`]s as inputs and commands are
/// added.
#[derive(Debug, Default)]
pub struct TransactionBlock {
    inputs: Vec<Input>,
    commands: Vec<Command>,
}

impl TransactionBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pure(&mut self, value: PureArg) -> Argument {
        self.input(Input::Pure(value))
    }

    pub fn shared_object(
        &mut self,
        id: ObjectId,
        initial_shared_version: u64,
        mutable: bool,
    ) -> Argument {
        self.input(Input::SharedObject {
            id,
            initial_shared_version,
            mutable,
        })
    }

    fn input(&mut self, input: Input) -> Argument {
        self.inputs.push(input);
        Argument::Input((self.inputs.len() - 1) as u16)
    }

    /// Append a command and return a reference to its result.
    pub fn command(&mut self, command: Command) -> Argument {
        self.commands.push(command);
        Argument::Result((self.commands.len() - 1) as u16)
    }

    pub fn finish(self) -> (Vec<Input>, Vec<Command>) {
        (self.inputs, self.commands)
    }
}

/// Nested result `index` of a command result.
pub fn nested(result: Argument, index: u16) -> Argument {
    match result {
        Argument::Result(command) => Argument::NestedResult(command, index),
        other => other,
    }
}

/// The sponsored purchase, ready for signing and execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseTransaction {
    pub buyer: Address,
    pub nft_id: ObjectId,
    pub price_mist: u64,
    pub royalty_mist: u64,
    pub inputs: Vec<Input>,
    pub commands: Vec<Command>,
}

impl PurchaseTransaction {
    /// MIST leaving the sponsor's gas coin besides gas.
    pub fn total_payment(&self) -> u64 {
        self.price_mist.saturating_add(self.royalty_mist)
    }

    pub fn move_calls(&self) -> impl Iterator<Item = &MoveCall> {
        self.commands.iter().filter_map(|command| match command {
            Command::MoveCall(call) => Some(call),
            _ => None,
        })
    }
}
