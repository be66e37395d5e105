//! Receipt
//!
//! Terminal rendering of a priced cart.

use std::{fmt::Write as _, io};

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    cart::Cart,
    items::LineItemId,
    listing::{ListQuery, Page, Searchable},
    money,
    pricing::{PriceBreakdown, PricingError, line_total, price_cart},
};

/// Errors that can occur while building or writing a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// The cart could not be priced.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Output could not be written.
    #[error("failed to write receipt")]
    IO,
}

/// One rendered cart line.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptLine<'a> {
    /// Line id, as the backend expects it in item routes
    pub id: LineItemId,

    /// Display name
    pub name: String,

    /// Units on the line
    pub quantity: u32,

    /// Price of one unit
    pub unit_price: Money<'a, Currency>,

    /// `unit_price × quantity`
    pub line_total: Money<'a, Currency>,
}

/// A priced cart, ready to print.
#[derive(Debug, Clone)]
pub struct Receipt<'a> {
    lines: Vec<ReceiptLine<'a>>,
    coupon_code: Option<String>,
    breakdown: PriceBreakdown<'a>,
}

impl<'a> Receipt<'a> {
    /// Price `cart` in `currency`.
    ///
    /// # Errors
    ///
    /// Returns a [`ReceiptError::Pricing`] if any amount is invalid.
    pub fn new(cart: &Cart, currency: &'a Currency) -> Result<Self, ReceiptError> {
        let lines = cart
            .items
            .iter()
            .map(|item| {
                Ok(ReceiptLine {
                    id: item.id.clone(),
                    name: item.name.clone(),
                    quantity: item.quantity.get(),
                    line_total: line_total(item, currency)?,
                    unit_price: money::from_decimal(item.unit_price, currency)
                        .map_err(PricingError::from)?,
                })
            })
            .collect::<Result<Vec<_>, ReceiptError>>()?;

        Ok(Self {
            lines,
            coupon_code: cart.applied_coupon.as_ref().map(|c| c.code.clone()),
            breakdown: price_cart(cart, currency)?,
        })
    }

    /// Rendered lines in cart order.
    pub fn lines(&self) -> &[ReceiptLine<'a>] {
        &self.lines
    }

    /// Totals.
    pub fn breakdown(&self) -> &PriceBreakdown<'a> {
        &self.breakdown
    }

    /// Code of the applied coupon, if any.
    pub fn coupon_code(&self) -> Option<&str> {
        self.coupon_code.as_deref()
    }

    /// Write the receipt table and summary.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiptError::IO`] if writing fails.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        write_receipt_table(&mut out, self.lines.iter())?;
        write_receipt_summary(&mut out, self)
    }

    /// Write one page of lines matching `query`, then the summary of the whole
    /// cart.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiptError::IO`] if writing fails.
    pub fn write_page(
        &self,
        query: &ListQuery,
        mut out: impl io::Write,
    ) -> Result<Page<&ReceiptLine<'a>>, ReceiptError> {
        let page = query.apply(self.lines.iter());

        write_receipt_table(&mut out, page.items.iter().copied())?;

        writeln!(
            out,
            " Page {} of {} ({} matching)\n",
            page.page, page.total_pages, page.total_items
        )
        .map_err(|_err| ReceiptError::IO)?;

        write_receipt_summary(&mut out, self)?;

        Ok(page)
    }
}

impl Searchable for ReceiptLine<'_> {
    fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.id.as_str().to_lowercase().contains(needle)
    }
}

fn write_receipt_table<'l, 'a: 'l>(
    out: &mut impl io::Write,
    lines: impl Iterator<Item = &'l ReceiptLine<'a>>,
) -> Result<(), ReceiptError> {
    let mut builder = Builder::default();

    builder.push_record(["ID", "Item", "Qty", "Unit Price", "Line Total"]);

    for line in lines {
        builder.push_record([
            line.id.to_string(),
            line.name.clone(),
            line.quantity.to_string(),
            line.unit_price.to_string(),
            line.line_total.to_string(),
        ]);
    }

    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(
        1,
        HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤')),
    );

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(2..5), Alignment::right());

    let table_str = colorize_borders(&table.to_string());

    writeln!(out, "\n{table_str}").map_err(|_err| ReceiptError::IO)
}

fn write_receipt_summary(
    out: &mut impl io::Write,
    receipt: &Receipt<'_>,
) -> Result<(), ReceiptError> {
    let breakdown = receipt.breakdown();
    let savings_percent_points = percent_points(breakdown);

    let discount_label = match receipt.coupon_code() {
        Some(code) => format!(" Discount ({code}):"),
        None => " Discount:".to_string(),
    };

    let rows = [
        (" Subtotal:".to_string(), format!("{}  ", breakdown.subtotal)),
        (
            discount_label,
            format!("({savings_percent_points:.2}%) -{}  ", breakdown.discount),
        ),
        (
            " \x1b[1mTotal:\x1b[0m".to_string(),
            format!("\x1b[1m{}\x1b[0m  ", breakdown.total),
        ),
    ];

    let label_width = rows
        .iter()
        .map(|(label, _)| visible_width(label))
        .max()
        .unwrap_or_default();

    let value_width = rows
        .iter()
        .map(|(_, value)| visible_width(value))
        .max()
        .unwrap_or_default();

    for (label, value) in &rows {
        write_summary_line(out, label, value, label_width, value_width)?;
    }

    writeln!(out).map_err(|_err| ReceiptError::IO)
}

/// Savings as percent points, for display.
fn percent_points(breakdown: &PriceBreakdown<'_>) -> Decimal {
    ((breakdown.savings_percent() * Decimal::ONE) * Decimal::ONE_HUNDRED).round_dp(2)
}

/// Wraps runs of box-drawing characters (U+2500..U+257F) in dark grey.
fn colorize_borders(table: &str) -> String {
    let mut out = String::with_capacity(table.len() + 256);
    let mut in_run = false;

    for ch in table.chars() {
        let box_char = ('\u{2500}'..='\u{257F}').contains(&ch);

        if box_char && !in_run {
            _ = out.write_str("\x1b[90m");
            in_run = true;
        } else if !box_char && in_run {
            _ = out.write_str("\x1b[0m");
            in_run = false;
        }

        out.push(ch);
    }

    if in_run {
        _ = out.write_str("\x1b[0m");
    }

    out
}

/// Width of a string with ANSI escapes stripped.
fn visible_width(s: &str) -> usize {
    let mut width = 0usize;
    let mut in_escape = false;

    for ch in s.chars() {
        if in_escape {
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else if ch == '\x1b' {
            in_escape = true;
        } else {
            width += 1;
        }
    }

    width
}

fn write_summary_line(
    out: &mut impl io::Write,
    label: &str,
    value: &str,
    label_col_width: usize,
    value_col_width: usize,
) -> Result<(), ReceiptError> {
    let label_pad = label_col_width.saturating_sub(visible_width(label));
    let value_pad = value_col_width.saturating_sub(visible_width(value));

    writeln!(
        out,
        "{:>label_pad$}{label}  {value_pad}{value}",
        "",
        value_pad = " ".repeat(value_pad)
    )
    .map_err(|_err| ReceiptError::IO)
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use rusty_money::iso::IDR;
    use testresult::TestResult;

    use crate::{coupons::Coupon, items::LineItem};

    use super::*;

    fn cart() -> Result<Cart, &'static str> {
        let two = NonZeroU32::new(2).ok_or("two is non-zero")?;

        Ok(Cart::with_items([
            LineItem::new("a", "card-a", "Holo Dragon", Decimal::new(100_000, 0), two),
            LineItem::new(
                "b",
                "card-b",
                "Foil Knight",
                Decimal::new(50_000, 0),
                NonZeroU32::MIN,
            ),
        ])
        .with_coupon(Coupon::percentage("TEN", Decimal::TEN)))
    }

    #[test]
    fn new_prices_every_line() -> TestResult {
        let cart = cart()?;
        let receipt = Receipt::new(&cart, IDR)?;

        assert_eq!(receipt.lines().len(), 2);
        assert_eq!(
            receipt.lines().first().map(|line| line.line_total),
            Some(Money::from_minor(20_000_000, IDR))
        );
        assert_eq!(receipt.breakdown().total, Money::from_minor(22_500_000, IDR));
        assert_eq!(receipt.coupon_code(), Some("TEN"));

        Ok(())
    }

    #[test]
    fn write_to_renders_lines_and_summary() -> TestResult {
        let cart = cart()?;
        let receipt = Receipt::new(&cart, IDR)?;
        let mut out = Vec::new();

        receipt.write_to(&mut out)?;

        let rendered = String::from_utf8(out)?;

        assert!(rendered.contains("Holo Dragon"));
        assert!(rendered.contains("Foil Knight"));
        assert!(rendered.contains("Discount (TEN):"));
        assert!(rendered.contains("(10.00%)"));
        assert!(rendered.contains(&receipt.breakdown().total.to_string()));

        Ok(())
    }

    #[test]
    fn write_page_filters_rows_but_keeps_cart_totals() -> TestResult {
        let cart = cart()?;
        let receipt = Receipt::new(&cart, IDR)?;
        let mut out = Vec::new();

        let page = receipt.write_page(&ListQuery::default().with_search("knight"), &mut out)?;

        let rendered = String::from_utf8(out)?;

        assert_eq!(page.total_items, 1);
        assert!(rendered.contains("Foil Knight"));
        assert!(!rendered.contains("Holo Dragon"));
        assert!(rendered.contains("Page 1 of 1 (1 matching)"));
        assert!(rendered.contains(&receipt.breakdown().total.to_string()));

        Ok(())
    }

    #[test]
    fn empty_cart_renders_zero_savings() -> TestResult {
        let receipt = Receipt::new(&Cart::default(), IDR)?;
        let mut out = Vec::new();

        receipt.write_to(&mut out)?;

        let rendered = String::from_utf8(out)?;

        assert!(rendered.contains(" Discount:"));
        assert!(rendered.contains("(0.00%)"));

        Ok(())
    }

    #[test]
    fn negative_price_fails_to_price() {
        let cart = Cart::with_items([LineItem::new(
            "bad",
            "card",
            "Broken",
            Decimal::NEGATIVE_ONE,
            NonZeroU32::MIN,
        )]);

        assert!(matches!(
            Receipt::new(&cart, IDR),
            Err(ReceiptError::Pricing(PricingError::NegativePrice(_)))
        ));
    }

    #[test]
    fn visible_width_ignores_escapes() {
        assert_eq!(visible_width("\x1b[1mTotal:\x1b[0m"), 6);
    }
}
