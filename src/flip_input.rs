//! Flip input state
//!
//! Headless state for a dual-sided amount field: the user types into one
//! currency and sees the converted value in the other. Toggling swaps which
//! side is editable. Decimal arithmetic and locale formatting are supplied by
//! the caller through [`ExchangeMath`] and [`LocaleFormat`]; rendering and
//! the flip animation belong to the view layer.
//!
//! Amounts move through three shapes:
//! - display amounts: locale formatted, what the text inputs show
//! - native decimal amounts: `.` separator, no grouping, what the parent receives
//! - converted amounts: the other side's native decimal before formatting

/// Digits of precision used when dividing secondary back into primary
pub const DIVISION_PRECISION: u32 = 18;

/// Decimal string arithmetic
pub trait ExchangeMath {
    fn mul(&self, a: &str, b: &str) -> String;
    fn div(&self, a: &str, b: &str, precision: u32) -> String;
}

/// Locale aware number formatting
pub trait LocaleFormat {
    /// Whether the user's keystrokes form an acceptable partial number
    fn is_valid_input(&self, display: &str) -> bool;

    /// Normalise typed input (grouping separators, leading zeros)
    fn prettify_number(&self, display: &str) -> String;

    /// Native decimal -> display amount
    fn format_number_input(&self, decimal: &str) -> String;

    /// Display amount -> native decimal
    fn format_to_native_number(&self, display: &str) -> String;

    fn decimal_separator(&self) -> char {
        '.'
    }

    fn truncate_display_decimals(&self, display: &str, max_decimals: u32) -> String {
        truncate_decimals_at(display, self.decimal_separator(), max_decimals)
    }
}

/// Cut a native decimal down to `max_decimals` fraction digits
///
/// No rounding. A trailing separator survives so partially typed input like
/// `"1."` is kept; with zero decimals allowed only the integer part remains.
pub fn truncate_decimals(amount: &str, max_decimals: u32) -> String {
    truncate_decimals_at(amount, '.', max_decimals)
}

fn truncate_decimals_at(amount: &str, separator: char, max_decimals: u32) -> String {
    match amount.split_once(separator) {
        None => amount.to_string(),
        Some((integers, _)) if max_decimals == 0 => integers.to_string(),
        Some((integers, decimals)) => {
            let kept: String = decimals.chars().take(max_decimals as usize).collect();
            format!("{}{}{}", integers, separator, kept)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlipInputFieldInfo {
    pub currency_name: String,
    pub currency_symbol: String,
    /// 3-5 character currency code
    pub currency_code: String,
    /// Decimals the user may type on this side
    pub max_entry_decimals: u32,
    /// Decimals kept when converting from the other side into this one
    pub max_conversion_decimals: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlipInputProps {
    /// Amount pushed in by the parent; empty means none
    pub override_primary_decimal_amount: String,
    /// Secondary units per one primary unit
    pub exchange_secondary_to_primary_ratio: String,
    pub primary_info: FlipInputFieldInfo,
    pub secondary_info: FlipInputFieldInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipFace {
    /// Primary editable, secondary shown below
    Front,
    /// Secondary editable, primary shown below
    Back,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlipInputState {
    pub is_toggled: bool,
    pub front_focused: bool,
    pub back_focused: bool,
    pub override_primary_decimal_amount: String,
    pub primary_display_amount: String,
    pub secondary_display_amount: String,
}

/// Outcome of a toggle for the view layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlipTransition {
    /// Face that is now in front
    pub face: FlipFace,
    /// Text input that should take keyboard focus, if focus has to move
    pub focus: Option<FlipFace>,
}

/// One visible row: field info and the amount to show
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlipRow<'a> {
    pub info: &'a FlipInputFieldInfo,
    pub amount: &'a str,
}

pub struct FlipInput<M, L> {
    props: FlipInputProps,
    math: M,
    locale: L,
    state: FlipInputState,
}

struct Displays {
    primary: String,
    secondary: String,
    primary_decimal: String,
}

impl<M: ExchangeMath, L: LocaleFormat> FlipInput<M, L> {
    pub fn new(props: FlipInputProps, math: M, locale: L) -> Self {
        let mut input = Self {
            props,
            math,
            locale,
            state: FlipInputState::default(),
        };

        if !input.props.override_primary_decimal_amount.is_empty() {
            let primary_decimal = truncate_decimals(
                &input.props.override_primary_decimal_amount,
                input.props.primary_info.max_entry_decimals,
            );
            let displays = input.primary_to_secondary(&primary_decimal);
            input.apply(displays);
        }
        input
    }

    pub fn state(&self) -> &FlipInputState {
        &self.state
    }

    pub fn props(&self) -> &FlipInputProps {
        &self.props
    }

    pub fn face(&self) -> FlipFace {
        if self.state.is_toggled {
            FlipFace::Back
        } else {
            FlipFace::Front
        }
    }

    /// Editable row on top, converted row below
    pub fn rows(&self) -> (FlipRow<'_>, FlipRow<'_>) {
        let primary = FlipRow {
            info: &self.props.primary_info,
            amount: &self.state.primary_display_amount,
        };
        let secondary = FlipRow {
            info: &self.props.secondary_info,
            amount: &self.state.secondary_display_amount,
        };
        let (top, mut bottom) = match self.face() {
            FlipFace::Front => (primary, secondary),
            FlipFace::Back => (secondary, primary),
        };
        if bottom.amount.is_empty() {
            bottom.amount = "0";
        }
        (top, bottom)
    }

    // ============================================================================
    // User events
    // ============================================================================

    /// Swap the editable side
    ///
    /// If the input on the face being hidden has focus, focus moves to the
    /// input on the face being shown.
    pub fn toggle(&mut self) -> FlipTransition {
        let was_toggled = self.state.is_toggled;
        self.state.is_toggled = !was_toggled;

        let focus = if was_toggled && self.state.back_focused {
            self.state.back_focused = false;
            self.state.front_focused = true;
            Some(FlipFace::Front)
        } else if !was_toggled && self.state.front_focused {
            self.state.front_focused = false;
            self.state.back_focused = true;
            Some(FlipFace::Back)
        } else {
            None
        };

        FlipTransition {
            face: self.face(),
            focus,
        }
    }

    pub fn set_focus(&mut self, face: FlipFace, focused: bool) {
        match face {
            FlipFace::Front => self.state.front_focused = focused,
            FlipFace::Back => self.state.back_focused = focused,
        }
    }

    /// User typed into the primary field
    ///
    /// Returns the primary native decimal amount to report to the parent, or
    /// None when the keystroke was rejected.
    pub fn on_primary_amount_change(&mut self, display_amount: &str) -> Option<String> {
        if !self.locale.is_valid_input(display_amount) {
            return None;
        }
        let formatted = self.locale.truncate_display_decimals(
            &self.locale.prettify_number(display_amount),
            self.props.primary_info.max_entry_decimals,
        );
        let decimal = self.locale.format_to_native_number(&formatted);

        let displays = self.primary_to_secondary(&decimal);
        self.apply(displays);
        Some(decimal)
    }

    /// User typed into the secondary field
    ///
    /// Returns the derived primary amount as a native decimal (not the locale
    /// formatted display amount), or None when the keystroke was rejected.
    pub fn on_secondary_amount_change(&mut self, display_amount: &str) -> Option<String> {
        if !self.locale.is_valid_input(display_amount) {
            return None;
        }
        let formatted = self.locale.truncate_display_decimals(
            &self.locale.prettify_number(display_amount),
            self.props.secondary_info.max_entry_decimals,
        );
        let decimal = self.locale.format_to_native_number(&formatted);

        let displays = self.secondary_to_primary(&decimal);
        let primary_decimal = displays.primary_decimal.clone();
        self.apply(displays);
        Some(primary_decimal)
    }

    // ============================================================================
    // Parent updates
    // ============================================================================

    /// New props from the parent (override amount or exchange rate changed)
    pub fn receive_props(&mut self, props: FlipInputProps) {
        self.props = props;

        if self.props.override_primary_decimal_amount != self.state.override_primary_decimal_amount {
            let primary_decimal = truncate_decimals(
                &self.props.override_primary_decimal_amount,
                self.props.primary_info.max_entry_decimals,
            );
            let displays = self.primary_to_secondary(&primary_decimal);
            self.apply(displays);
            self.state.override_primary_decimal_amount =
                self.props.override_primary_decimal_amount.clone();
        } else if !self.state.is_toggled {
            let decimal = self
                .locale
                .format_to_native_number(&self.state.primary_display_amount);
            let displays = self.primary_to_secondary(&decimal);
            self.apply(displays);
        } else {
            let decimal = self
                .locale
                .format_to_native_number(&self.state.secondary_display_amount);
            let displays = self.secondary_to_primary(&decimal);
            self.apply(displays);
        }
    }

    // ============================================================================
    // Conversion
    // ============================================================================

    fn primary_to_secondary(&self, primary_decimal: &str) -> Displays {
        if primary_decimal.is_empty() {
            return Displays::empty();
        }
        let secondary = self
            .math
            .mul(primary_decimal, &self.props.exchange_secondary_to_primary_ratio);
        let secondary = truncate_decimals(&secondary, self.props.secondary_info.max_conversion_decimals);

        Displays {
            primary: self.locale.format_number_input(primary_decimal),
            secondary: self.locale.format_number_input(&secondary),
            primary_decimal: primary_decimal.to_string(),
        }
    }

    fn secondary_to_primary(&self, secondary_decimal: &str) -> Displays {
        if secondary_decimal.is_empty() {
            return Displays::empty();
        }
        let primary = self.math.div(
            secondary_decimal,
            &self.props.exchange_secondary_to_primary_ratio,
            DIVISION_PRECISION,
        );
        let primary = truncate_decimals(&primary, self.props.primary_info.max_conversion_decimals);

        Displays {
            primary: self.locale.format_number_input(&primary),
            secondary: self.locale.format_number_input(secondary_decimal),
            primary_decimal: primary,
        }
    }

    fn apply(&mut self, displays: Displays) {
        self.state.primary_display_amount = displays.primary;
        self.state.secondary_display_amount = displays.secondary;
    }
}

impl Displays {
    fn empty() -> Self {
        Self {
            primary: String::new(),
            secondary: String::new(),
            primary_decimal: String::new(),
        }
    }
}
