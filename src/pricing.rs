//! Markup arithmetic shared by products, sales, CSV import and restore.

/// Derived price columns stored alongside every product row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBreakdown {
    pub selling_price: f64,
    pub profit: f64,
    pub total_profit: f64,
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn selling_price(actual_price: f64, markup_percentage: f64) -> f64 {
    round_cents(actual_price * (1.0 + markup_percentage / 100.0))
}

pub fn breakdown(actual_price: f64, markup_percentage: f64, quantity: i64) -> PriceBreakdown {
    let selling_price = selling_price(actual_price, markup_percentage);
    let profit = round_cents(selling_price - actual_price);
    PriceBreakdown {
        selling_price,
        profit,
        total_profit: round_cents(profit * quantity as f64),
    }
}

/// Realised profit of a sale, measured against the product's cost.
pub fn sale_profit(sale_price: f64, actual_price: f64, quantity_sold: i64) -> f64 {
    round_cents((sale_price - actual_price) * quantity_sold as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_of_25_percent_on_100() {
        let prices = breakdown(100.0, 25.0, 1);
        assert_eq!(prices.selling_price, 125.0);
        assert_eq!(prices.profit, 25.0);
        assert_eq!(prices.total_profit, 25.0);
    }

    #[test]
    fn total_profit_scales_with_quantity() {
        let prices = breakdown(40.0, 50.0, 4);
        assert_eq!(prices.selling_price, 60.0);
        assert_eq!(prices.total_profit, 80.0);
    }

    #[test]
    fn zero_markup_means_zero_profit() {
        let prices = breakdown(19.99, 0.0, 3);
        assert_eq!(prices.selling_price, 19.99);
        assert_eq!(prices.profit, 0.0);
        assert_eq!(prices.total_profit, 0.0);
    }

    #[test]
    fn rounds_to_cents() {
        assert_eq!(selling_price(10.0, 33.333), 13.33);
        assert_eq!(round_cents(2.675_000_1), 2.68);
    }

    #[test]
    fn sale_profit_can_be_negative() {
        assert_eq!(sale_profit(80.0, 100.0, 2), -40.0);
        assert_eq!(sale_profit(130.0, 100.0, 3), 90.0);
    }
}
