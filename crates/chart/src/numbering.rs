//! Account-number derivation.
//!
//! Account numbers are assembled from fixed-width, zero-padded fields rather
//! than ad hoc string concatenation, so every derived format is reproducible
//! from (template, branch code, suffix) alone:
//!
//! - **network number**: bank code ++ branch code ++ template ++ suffix,
//!   unique across the whole network;
//! - **branch-local number**: template ++ suffix, unique within one branch;
//! - **reference number**: the bare template number, the key used by the
//!   balance-sheet corresponding-mapping table.

use serde::{Deserialize, Serialize};

use corebank_core::{LedgerError, LedgerResult, ValueObject};

/// The derived formats of one account's number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountNumber {
    pub network: String,
    pub branch_local: String,
    pub reference: String,
}

impl AccountNumber {
    /// Leading digit of the reference number (chart-class discriminant).
    pub fn leading_digit(&self) -> Option<char> {
        self.reference.chars().next()
    }
}

impl ValueObject for AccountNumber {}

/// Pure derivation rules for account numbers.
///
/// Holds the institution's bank code and the field widths of the national
/// numbering convention. Deriving twice from the same inputs yields equal
/// `AccountNumber`s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountNumberingScheme {
    bank_code: String,
    branch_code_width: usize,
    suffix_width: usize,
}

impl AccountNumberingScheme {
    pub fn new(
        bank_code: impl Into<String>,
        branch_code_width: usize,
        suffix_width: usize,
    ) -> LedgerResult<Self> {
        let bank_code = bank_code.into();
        if bank_code.is_empty() || !bank_code.chars().all(|c| c.is_ascii_digit()) {
            return Err(LedgerError::validation(format!(
                "bank code must be numeric and non-empty, got {bank_code:?}"
            )));
        }
        if branch_code_width == 0 || suffix_width == 0 {
            return Err(LedgerError::validation(
                "numbering field widths must be non-zero",
            ));
        }
        Ok(Self {
            bank_code,
            branch_code_width,
            suffix_width,
        })
    }

    pub fn bank_code(&self) -> &str {
        &self.bank_code
    }

    /// Network-wide number: bank ++ branch ++ template ++ suffix.
    pub fn network_number(&self, template: &str, branch_code: &str, suffix: u32) -> String {
        format!(
            "{}{}{}{}",
            self.bank_code,
            self.pad_branch(branch_code),
            template,
            self.pad_suffix(suffix),
        )
    }

    /// Branch-local number: template ++ suffix.
    pub fn branch_local_number(&self, template: &str, suffix: u32) -> String {
        format!("{}{}", template, self.pad_suffix(suffix))
    }

    /// Reference number: the bare chart template number.
    pub fn reference_number(&self, template: &str) -> String {
        template.to_string()
    }

    /// Derive all formats at once.
    pub fn derive(&self, template: &str, branch_code: &str, suffix: u32) -> AccountNumber {
        AccountNumber {
            network: self.network_number(template, branch_code, suffix),
            branch_local: self.branch_local_number(template, suffix),
            reference: self.reference_number(template),
        }
    }

    fn pad_branch(&self, branch_code: &str) -> String {
        format!("{:0>width$}", branch_code, width = self.branch_code_width)
    }

    fn pad_suffix(&self, suffix: u32) -> String {
        format!("{:0>width$}", suffix, width = self.suffix_width)
    }
}

impl ValueObject for AccountNumberingScheme {}
