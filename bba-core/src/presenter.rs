//! Top-of-book line formatting

use rust_decimal::{Decimal, RoundingStrategy};

use crate::book::TopOfBook;

/// Price decimals in printed output
const PRICE_DP: usize = 8;

/// Size decimals in printed output
const SIZE_DP: usize = 6;

/// Round half away from zero, so `0.0000005` prints as `0.000001`
fn round_to(value: Decimal, dp: usize) -> Decimal {
    value.round_dp_with_strategy(dp as u32, RoundingStrategy::MidpointAwayFromZero)
}

/// Format one best bid/ask line for an instrument
pub fn format_top_of_book(instrument_id: &str, top: &TopOfBook) -> String {
    format!(
        "{} → Best Bid: {:.pdp$} (qty {:.sdp$}) | Best Ask: {:.pdp$} (qty {:.sdp$})",
        instrument_id,
        round_to(top.bid_price, PRICE_DP),
        round_to(top.bid_size, SIZE_DP),
        round_to(top.ask_price, PRICE_DP),
        round_to(top.ask_size, SIZE_DP),
        pdp = PRICE_DP,
        sdp = SIZE_DP,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_pads_fractional_digits() {
        let top = TopOfBook {
            bid_price: dec!(43250.00),
            bid_size: dec!(0.5),
            ask_price: dec!(43251.50),
            ask_size: dec!(0.75),
        };

        assert_eq!(
            format_top_of_book("BTC-USD", &top),
            "BTC-USD → Best Bid: 43250.00000000 (qty 0.500000) | Best Ask: 43251.50000000 (qty 0.750000)"
        );
    }

    #[test]
    fn test_format_keeps_small_prices_exact() {
        let top = TopOfBook {
            bid_price: dec!(0.00001234),
            bid_size: dec!(1500000),
            ask_price: dec!(0.00001235),
            ask_size: dec!(0.000001),
        };

        let line = format_top_of_book("SHIB-USD", &top);
        assert!(line.contains("Best Bid: 0.00001234 (qty 1500000.000000)"));
        assert!(line.contains("Best Ask: 0.00001235 (qty 0.000001)"));
    }

    #[test]
    fn test_format_rounds_half_away_from_zero() {
        let top = TopOfBook {
            bid_price: dec!(100.123456785),
            bid_size: dec!(0.12345678),
            ask_price: dec!(100.999999999),
            ask_size: dec!(0.0000005),
        };

        assert_eq!(
            format_top_of_book("BTC-USD", &top),
            "BTC-USD → Best Bid: 100.12345679 (qty 0.123457) | Best Ask: 101.00000000 (qty 0.000001)"
        );
    }
}
