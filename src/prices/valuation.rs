/// Wallet valuation on top of batch price lookups
use super::service::PriceService;
use super::types::{normalize_address, PriceQuote, PriceSource};
use serde::{Deserialize, Serialize};

/// A raw token balance held by a wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenHolding {
    pub address: String,
    pub symbol: String,
    /// Integer amount in the token's smallest unit
    pub amount: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenValue {
    pub address: String,
    pub symbol: String,
    pub amount: String,
    pub decimals: u8,
    pub price: f64,
    pub value: f64,
    pub source: PriceSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletValue {
    pub total_value: f64,
    pub tokens: Vec<TokenValue>,
}

impl TokenHolding {
    /// Amount scaled by decimals; unparseable amounts count as zero
    pub fn ui_amount(&self) -> f64 {
        let raw: f64 = self.amount.trim().parse().unwrap_or(0.0);
        raw / 10f64.powi(self.decimals as i32)
    }
}

/// Value a set of holdings with one batch lookup
pub async fn value_wallet(service: &PriceService, holdings: &[TokenHolding]) -> WalletValue {
    let addresses: Vec<String> = holdings.iter().map(|h| h.address.clone()).collect();
    let prices = if addresses.is_empty() {
        Default::default()
    } else {
        service.get_prices(&addresses).await
    };

    let tokens: Vec<TokenValue> = holdings
        .iter()
        .map(|holding| {
            let quote = prices
                .get(&normalize_address(&holding.address))
                .copied()
                .unwrap_or_else(PriceQuote::unavailable);
            TokenValue {
                address: holding.address.clone(),
                symbol: holding.symbol.clone(),
                amount: holding.amount.clone(),
                decimals: holding.decimals,
                price: quote.price,
                value: holding.ui_amount() * quote.price,
                source: quote.source,
            }
        })
        .collect();

    WalletValue {
        total_value: tokens.iter().map(|t| t.value).sum(),
        tokens,
    }
}

/// Human-readable USD amount
///
/// `$0.00`, `<$0.01`, three decimals below $1, two below $100, none above.
pub fn format_usd(value: f64) -> String {
    if value == 0.0 {
        "$0.00".to_string()
    } else if value < 0.01 {
        "<$0.01".to_string()
    } else if value < 1.0 {
        format!("${:.3}", value)
    } else if value < 100.0 {
        format!("${:.2}", value)
    } else {
        format!("${:.0}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prices::cache::PriceCache;
    use crate::prices::provider::PriceProvider;
    use crate::prices::service::tests::MockProvider;
    use std::sync::Arc;
    use std::time::Duration;

    fn holding(address: &str, symbol: &str, amount: &str, decimals: u8) -> TokenHolding {
        TokenHolding {
            address: address.to_string(),
            symbol: symbol.to_string(),
            amount: amount.to_string(),
            decimals,
        }
    }

    #[test]
    fn test_format_usd_bands() {
        assert_eq!(format_usd(0.0), "$0.00");
        assert_eq!(format_usd(0.004), "<$0.01");
        assert_eq!(format_usd(0.5), "$0.500");
        assert_eq!(format_usd(12.346), "$12.35");
        assert_eq!(format_usd(1234.6), "$1235");
    }

    #[test]
    fn test_ui_amount() {
        assert_eq!(holding("0x1", "USDC", "2500000", 6).ui_amount(), 2.5);
        assert_eq!(holding("0x1", "BAD", "abc", 18).ui_amount(), 0.0);
    }

    #[tokio::test]
    async fn test_value_wallet_single_batch() {
        let primary = Arc::new(MockProvider::new("primary", true, &[("0xusdc", 1.0), ("0xweth", 3000.0)]));
        let fallback = Arc::new(MockProvider::failing("fallback", false));
        let service = PriceService::new(
            PriceCache::default(),
            vec![primary.clone() as Arc<dyn PriceProvider>, fallback],
            Duration::from_secs(1),
        );

        let wallet = value_wallet(
            &service,
            &[
                holding("0xUSDC", "USDC", "2500000", 6),
                holding("0xweth", "WETH", "500000000000000000", 18),
                holding("0xdead", "DEAD", "1000", 0),
            ],
        )
        .await;

        assert_eq!(wallet.tokens.len(), 3);
        assert_eq!(wallet.tokens[0].value, 2.5);
        assert_eq!(wallet.tokens[0].address, "0xUSDC");
        assert_eq!(wallet.tokens[1].value, 1500.0);
        assert_eq!(wallet.tokens[2].price, 0.0);
        assert_eq!(wallet.tokens[2].source, PriceSource::None);
        assert_eq!(wallet.total_value, 1502.5);
        assert_eq!(primary.calls(), 1);

        let json = serde_json::to_value(&wallet).unwrap();
        assert_eq!(json["totalValue"], serde_json::json!(1502.5));
        assert_eq!(json["tokens"][0]["symbol"], serde_json::json!("USDC"));
        assert_eq!(json["tokens"][1]["source"], serde_json::json!("primary"));
    }

    #[tokio::test]
    async fn test_value_empty_wallet() {
        let primary = Arc::new(MockProvider::new("primary", true, &[]));
        let service = PriceService::new(
            PriceCache::default(),
            vec![primary.clone() as Arc<dyn PriceProvider>],
            Duration::from_secs(1),
        );
        let wallet = value_wallet(&service, &[]).await;
        assert_eq!(wallet.total_value, 0.0);
        assert!(wallet.tokens.is_empty());
        assert_eq!(primary.calls(), 0);
    }
}
