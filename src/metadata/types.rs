use serde::{Deserialize, Serialize};

pub const UNKNOWN_SYMBOL: &str = "Unknown";
pub const UNKNOWN_NAME: &str = "Unknown Token";

/// Display metadata for a mint, independent of any amount.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TokenInfo {
    pub mint: String,
    pub symbol: String,
    pub name: String,
}

impl TokenInfo {
    pub fn new(mint: impl Into<String>, symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            mint: mint.into(),
            symbol: symbol.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenMetadataRequest<'a> {
    pub mint_accounts: Vec<&'a str>,
    pub include_off_chain: bool,
    pub disable_cache: bool,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct NamedMetadata {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct OnChainData {
    #[serde(default)]
    pub data: Option<NamedMetadata>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct OnChainMetadata {
    #[serde(default)]
    pub metadata: Option<OnChainData>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct OffChainMetadata {
    #[serde(default)]
    pub metadata: Option<NamedMetadata>,
}

/// One entry of the indexer's token-metadata response.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenMetadataEntry {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub on_chain_metadata: Option<OnChainMetadata>,
    #[serde(default)]
    pub off_chain_metadata: Option<OffChainMetadata>,
    #[serde(default)]
    pub legacy_metadata: Option<NamedMetadata>,
}

impl TokenMetadataEntry {
    fn candidates(&self) -> Vec<&NamedMetadata> {
        let on_chain = self
            .on_chain_metadata
            .as_ref()
            .and_then(|m| m.metadata.as_ref())
            .and_then(|m| m.data.as_ref());
        let off_chain = self.off_chain_metadata.as_ref().and_then(|m| m.metadata.as_ref());

        on_chain
            .into_iter()
            .chain(off_chain)
            .chain(self.legacy_metadata.as_ref())
            .collect()
    }

    pub fn into_token_info(self, mint: &str) -> TokenInfo {
        let nested = self.candidates();

        let symbol = first_present(
            self.symbol.as_deref(),
            nested.iter().map(|m| m.symbol.as_deref()),
        )
        .unwrap_or(UNKNOWN_SYMBOL);
        let name = first_present(
            self.name.as_deref(),
            nested.iter().map(|m| m.name.as_deref()),
        )
        .unwrap_or(UNKNOWN_NAME);

        TokenInfo::new(mint, symbol, name)
    }
}

// On-chain strings come back padded with NULs.
fn clean(value: Option<&str>) -> Option<&str> {
    value
        .map(|v| v.trim_matches(char::from(0)).trim())
        .filter(|v| !v.is_empty())
}

fn first_present<'a>(
    top_level: Option<&'a str>,
    nested: impl Iterator<Item = Option<&'a str>>,
) -> Option<&'a str> {
    std::iter::once(top_level).chain(nested).find_map(clean)
}
