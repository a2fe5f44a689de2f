//! Lowering of the chain-agnostic purchase transaction onto a Sui
//! programmable transaction.
//!
//! Commands map one-to-one, so `Result(i)` references carry over unchanged.
//! Inputs do not: the SDK builder deduplicates identical pure values, so
//! every core input index is remapped through the argument the builder
//! actually returned.

use gate_core::purchase::{Argument, Command, Input, PureArg, PurchaseTransaction};
use sui_types::Identifier;
use sui_types::base_types::SequenceNumber;
use sui_types::programmable_transaction_builder::ProgrammableTransactionBuilder;
use sui_types::transaction::{
    Argument as SuiArgument, CallArg, Command as SuiCommand, ObjectArg, ProgrammableTransaction,
    SharedObjectMutability,
};

use crate::convert::{to_object_id, to_sui_address};
use crate::error::{Result, SuiError};

pub fn lower_purchase(transaction: &PurchaseTransaction) -> Result<ProgrammableTransaction> {
    let mut ptb = ProgrammableTransactionBuilder::new();

    let inputs = transaction
        .inputs
        .iter()
        .map(|input| lower_input(&mut ptb, input))
        .collect::<Result<Vec<_>>>()?;

    for command in &transaction.commands {
        let lowered = match command {
            Command::SplitCoins { coin, amounts } => SuiCommand::SplitCoins(
                lower_argument(&inputs, *coin)?,
                lower_arguments(&inputs, amounts)?,
            ),
            Command::MoveCall(call) => {
                let type_arguments = call
                    .type_arguments
                    .iter()
                    .map(|tag| {
                        sui_types::parse_sui_type_tag(tag).map_err(|e| {
                            SuiError::Lowering(format!("invalid type argument {tag}: {e}"))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;

                SuiCommand::move_call(
                    to_object_id(&call.package),
                    identifier(&call.module)?,
                    identifier(&call.function)?,
                    type_arguments,
                    lower_arguments(&inputs, &call.arguments)?,
                )
            }
            Command::TransferObjects { objects, recipient } => SuiCommand::TransferObjects(
                lower_arguments(&inputs, objects)?,
                lower_argument(&inputs, *recipient)?,
            ),
        };
        ptb.command(lowered);
    }

    Ok(ptb.finish())
}

fn lower_input(ptb: &mut ProgrammableTransactionBuilder, input: &Input) -> Result<SuiArgument> {
    let argument = match input {
        Input::Pure(PureArg::U64(value)) => ptb.pure(*value),
        Input::Pure(PureArg::Address(address)) => ptb.pure(to_sui_address(address)),
        Input::Pure(PureArg::Id(id)) => ptb.pure(to_object_id(id)),
        Input::SharedObject {
            id,
            initial_shared_version,
            mutable,
        } => ptb.input(CallArg::Object(ObjectArg::SharedObject {
            id: to_object_id(id),
            initial_shared_version: SequenceNumber::from_u64(*initial_shared_version),
            mutability: if *mutable {
                SharedObjectMutability::Mutable
            } else {
                SharedObjectMutability::Immutable
            },
        })),
    };
    argument.map_err(|e| SuiError::Lowering(format!("failed to add input: {e}")))
}

fn lower_argument(inputs: &[SuiArgument], argument: Argument) -> Result<SuiArgument> {
    match argument {
        Argument::GasCoin => Ok(SuiArgument::GasCoin),
        Argument::Input(index) => inputs
            .get(index as usize)
            .copied()
            .ok_or_else(|| SuiError::Lowering(format!("input {index} out of range"))),
        Argument::Result(command) => Ok(SuiArgument::Result(command)),
        Argument::NestedResult(command, index) => Ok(SuiArgument::NestedResult(command, index)),
    }
}

fn lower_arguments(inputs: &[SuiArgument], arguments: &[Argument]) -> Result<Vec<SuiArgument>> {
    arguments
        .iter()
        .map(|argument| lower_argument(inputs, *argument))
        .collect()
}

fn identifier(name: &str) -> Result<Identifier> {
    Identifier::new(name).map_err(|e| SuiError::Lowering(format!("invalid identifier {name}: {e}")))
}
