use solana_transaction_status::{
    option_serializer::OptionSerializer,
    EncodedConfirmedTransactionWithStatusMeta,
    EncodedTransaction,
    UiInstruction,
    UiMessage,
    UiParsedInstruction,
    UiTransactionTokenBalance,
};

use super::types::{block_time_to_utc, MintBalance, ParsedTransaction};

/// Flattens an RPC `getTransaction` result into the fields the classifier
/// needs. Returns `None` while the ledger has no meta or block time yet.
pub fn parsed_transaction(
    signature: &str,
    confirmed: EncodedConfirmedTransactionWithStatusMeta,
) -> Option<ParsedTransaction> {
    let block_time = confirmed.block_time.and_then(block_time_to_utc)?;
    let meta = confirmed.transaction.meta?;

    Some(ParsedTransaction {
        signature: signature.to_string(),
        block_time,
        succeeded: meta.err.is_none(),
        pre_balances: mint_balances(&meta.pre_token_balances),
        post_balances: mint_balances(&meta.post_token_balances),
        top_level_program: first_program_id(&confirmed.transaction.transaction),
    })
}

pub fn mint_balances(
    balances: &OptionSerializer<Vec<UiTransactionTokenBalance>>,
) -> Vec<MintBalance> {
    match balances {
        OptionSerializer::Some(balances) => balances
            .iter()
            .map(|b| MintBalance::new(b.mint.clone(), b.ui_token_amount.ui_amount))
            .collect(),
        _ => Vec::new(),
    }
}

/// Program executing the first top-level instruction.
pub fn first_program_id(transaction: &EncodedTransaction) -> Option<String> {
    let EncodedTransaction::Json(ui_transaction) = transaction else {
        return None;
    };

    match &ui_transaction.message {
        UiMessage::Parsed(message) => match message.instructions.first()? {
            UiInstruction::Parsed(UiParsedInstruction::Parsed(ix)) => Some(ix.program_id.clone()),
            UiInstruction::Parsed(UiParsedInstruction::PartiallyDecoded(ix)) => {
                Some(ix.program_id.clone())
            }
            UiInstruction::Compiled(ix) => message
                .account_keys
                .get(ix.program_id_index as usize)
                .map(|account| account.pubkey.clone()),
        },
        UiMessage::Raw(message) => {
            let ix = message.instructions.first()?;
            message.account_keys.get(ix.program_id_index as usize).cloned()
        }
    }
}
