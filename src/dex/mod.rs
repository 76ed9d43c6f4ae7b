pub mod protocols;

use serde::Serialize;
use std::fmt;

use protocols::*;

/// Well-known programs a top-level instruction may belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DexProtocol {
    Jupiter,
    Raydium,
    Orca,
    Meteora,
    PumpFun,
    SplToken,
    ComputeBudget,
}

impl DexProtocol {
    pub fn identify(program_id: &str) -> Option<Self> {
        match program_id {
            JUPITER_PROGRAM_ID => Some(DexProtocol::Jupiter),
            RAYDIUM_AMM_PROGRAM_ID | RAYDIUM_CLMM_PROGRAM_ID => Some(DexProtocol::Raydium),
            ORCA_WHIRLPOOL_PROGRAM_ID => Some(DexProtocol::Orca),
            METEORA_DLMM_PROGRAM_ID => Some(DexProtocol::Meteora),
            PUMPFUN_PROGRAM_ID => Some(DexProtocol::PumpFun),
            TOKEN_PROGRAM_ID => Some(DexProtocol::SplToken),
            COMPUTE_BUDGET_PROGRAM_ID => Some(DexProtocol::ComputeBudget),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DexProtocol::Jupiter => "Jupiter",
            DexProtocol::Raydium => "Raydium",
            DexProtocol::Orca => "Orca",
            DexProtocol::Meteora => "Meteora",
            DexProtocol::PumpFun => "Pump.fun",
            DexProtocol::SplToken => "SPL Token",
            DexProtocol::ComputeBudget => "Compute Budget",
        }
    }
}

impl fmt::Display for DexProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
