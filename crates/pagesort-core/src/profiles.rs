// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document type profiles — the keyword corpus that drives page classification.
//
// The table is built once at startup (either the built-in shipping-document
// corpus or a JSON override) and handed to the classifier by reference. It is
// never mutated while pages are processed.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PagesortError, Result};
use crate::types::UNKNOWN_TYPE;

/// Keyword profile for one document type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeProfile {
    /// Document type identifier, e.g. `INVOICE`.
    pub name: String,
    /// Phrases of which at least one must appear for the type to be considered.
    pub primary_keywords: Vec<String>,
    /// Corroborating phrases counted towards the score.
    #[serde(default)]
    pub secondary_keywords: Vec<String>,
    /// Secondary matches a functional type needs before it may win.
    #[serde(default)]
    pub min_secondary_matches: usize,
    /// Whether pages of this type are kept in the split output.
    #[serde(default)]
    pub functional: bool,
    /// Reserved for future tie-breaking; not consulted by selection.
    #[serde(default)]
    pub priority: i32,
}

impl TypeProfile {
    /// Start a profile with the given primary keywords and no secondary ones.
    pub fn new(name: impl Into<String>, primary: &[&str]) -> Self {
        Self {
            name: name.into(),
            primary_keywords: primary.iter().map(|k| k.to_string()).collect(),
            secondary_keywords: Vec::new(),
            min_secondary_matches: 0,
            functional: false,
            priority: 0,
        }
    }

    pub fn with_secondary(mut self, secondary: &[&str]) -> Self {
        self.secondary_keywords = secondary.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn min_secondary(mut self, count: usize) -> Self {
        self.min_secondary_matches = count;
        self
    }

    pub fn functional(mut self, functional: bool) -> Self {
        self.functional = functional;
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Ordered, immutable collection of [`TypeProfile`]s.
///
/// Order matters only for complete ties during classification: the profile
/// listed first wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileTable {
    profiles: Vec<TypeProfile>,
}

impl ProfileTable {
    /// Build a table, rejecting duplicate or reserved names and profiles
    /// without primary keywords.
    pub fn new(profiles: Vec<TypeProfile>) -> Result<Self> {
        let table = Self { profiles };
        table.validate()?;
        Ok(table)
    }

    /// Load a table from a JSON file shaped as `{ "profiles": [ ... ] }`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        let table: Self = serde_json::from_str(&data).map_err(|err| {
            PagesortError::InvalidProfile(format!("cannot parse {}: {}", path.display(), err))
        })?;
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for profile in &self.profiles {
            if profile.name.trim().is_empty() {
                return Err(PagesortError::InvalidProfile("empty type name".into()));
            }
            if profile.name == UNKNOWN_TYPE {
                return Err(PagesortError::InvalidProfile(format!(
                    "`{UNKNOWN_TYPE}` is reserved for unclassified pages"
                )));
            }
            if !seen.insert(profile.name.as_str()) {
                return Err(PagesortError::InvalidProfile(format!(
                    "duplicate type name `{}`",
                    profile.name
                )));
            }
            if profile.primary_keywords.iter().all(|k| k.trim().is_empty()) {
                return Err(PagesortError::InvalidProfile(format!(
                    "`{}` has no primary keywords",
                    profile.name
                )));
            }
        }
        Ok(())
    }

    pub fn profiles(&self) -> &[TypeProfile] {
        &self.profiles
    }

    pub fn get(&self, name: &str) -> Option<&TypeProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Whether pages of `name` are retained. `UNKNOWN` and unlisted types are not.
    pub fn is_functional(&self, name: &str) -> bool {
        self.get(name).is_some_and(|p| p.functional)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// The shipping-document corpus: commercial paperwork that is kept
    /// (invoices, packing lists, packing slips) and administrative paperwork
    /// that is classified only to be discarded.
    pub fn builtin() -> Self {
        Self {
            profiles: vec![
                TypeProfile::new(
                    "INVOICE",
                    &["invoice", "fatura", "commercial invoice", "original invoice"],
                )
                .with_secondary(&[
                    "payment terms", "terms of payment", "value", "deduction",
                    "invoice #", "net 30", "net 30 days", "tracking",
                    "amount due", "balance due", "tax", "tax rate", "number", "amount",
                    "subtotal", "tax amount", "invoice", "total amount", "unit", "unit price",
                    "extended price", "price", "(usd)", "usd", "freight", "products",
                    "remit to", "wire transfer", "swift code", "IRN", "purchase",
                    "invoice number", "commercial", "description", "point", "account",
                    "bank account", "account number", "customer po", "po box",
                    "salesorder", "completed salesorder", "po number", "swift",
                    "tax id", "tax registration", "order", "p.o", "direct inquiries",
                    "customs invoice", "csi", "$", "customer", "sales", "bank",
                    "bill to", "billed to", "sold to", "delivery point", "buyer",
                    "ship from", "ship to", "ship via", "sales representative",
                    "your tax number", "discount", "payment method",
                ])
                .min_secondary(3)
                .functional(true)
                .priority(100),
                TypeProfile::new(
                    "PACKING_LIST",
                    &["packing list", "packinglist", "packlist"],
                )
                .with_secondary(&[
                    "your order no", "delivery no", "packing list", "package", "part number",
                    "delivery per", "lb", "swift code", "total weight", "carton",
                    "shipping method", "quantity ordered", "quantity shipped",
                    "gross weight", "net weight", "oty", "stock", "bill to", "company",
                    "ship to", "shipped to", "packed by", "pieces", "po", "customer po",
                    "kg", "quantity", "qty", "net", "purchase order", "po#", "item",
                    "terms of delivery", "delivery terms", "exw", "fob", "gross", "order",
                    "pos", "material", "coo", "dimensions", "packaging", "meauserement",
                    "lot code", "quant", "incoterms", "shipped", "total shipped",
                    "packing list no", "purchase order number", "packing list number", "pkg",
                    "shipment", "addendum", "shipper:", "wt", "dim", "inches", "packed",
                    "shipment number", "box", "boxes", "cartons", "sales", "sales order",
                    "ship via", "item number", "rel", "packed qty", "u/m", "ea",
                ])
                .min_secondary(3)
                .functional(true)
                .priority(90),
                TypeProfile::new(
                    "PACKING_SLIP",
                    &["packing slip", "packingslip", "pack slip"],
                )
                .with_secondary(&[
                    "shipment reference", "tracking number",
                    "customer", "partner", "packing slip", "bill to", "ship to",
                    "load", "unit", "lb", "kg", "delivery terms", "terms of delivery",
                    "shipped to", "ship via", "terms", "order", "order number",
                    "package quantity", "shipped quantity", "gross", "pos",
                    "back order", "weight", "boxes", "content", "contents",
                    "ship-from warehouse", "total weight",
                    "ordered", "shipped", "line item", "catalog", "qty", "oty",
                    "um", "ship from", "pack", "pack date", "uom",
                    "license type", "license number", "packing details", "condition",
                    "serial number", "po no", "pack slip", "pack slip No",
                    "exporter", "waybill",
                ])
                .min_secondary(3)
                .functional(true)
                .priority(80),
                TypeProfile::new(
                    "CERTIFICATE_ORIGIN",
                    &["certificate of origin", "certificate", "certificate of conformance"],
                )
                .with_secondary(&[
                    "conformance", "manufacturer", "approving", "faa", "faa form",
                    "hts number", "hts code", "order number", "organization", "mouser",
                    "harmonized", "customs", "material", "covered", "tracking", "hts",
                    "eccn", "country", "consignee", "authority", "approval", "distributor",
                    "coo", "certify", "date", "p.o", "serial number", "purchase order",
                    "tariff", "autorized", "authorized", "manufacturers", "MANUFACTURERS'",
                    "listing", "below",
                ])
                .min_secondary(2)
                .priority(10),
                TypeProfile::new("CARTAGE_ADVICE", &["cartage advice", "booking details"])
                    .with_secondary(&[
                        "transport booking",
                        "transport company",
                        "pick up:",
                        "delivery:",
                        "instructions details",
                        "shipment:",
                    ])
                    .min_secondary(2)
                    .priority(10),
                TypeProfile::new(
                    "KNOWN_SHIPPER",
                    &["known shipper cargo", "known shipper", "id check"],
                )
                .with_secondary(&[
                    "blank", "reviewed", "matching", "photo", "ground", "type", "first",
                    "id", "indicate", "global", "government", "authority", "time",
                ])
                .min_secondary(4)
                .priority(10),
                TypeProfile::new("DELIVERY_NOTE", &["delivery note", "delivery receipt"])
                    .with_secondary(&[
                        "terms of delivery", "responsible is", "customer", "responsible",
                        "number", "reference", "reference number", "our order no",
                        "customer number", "fax", "waybill", "copy", "prepaid", "collect",
                    ])
                    .min_secondary(2)
                    .priority(10),
                TypeProfile::new(
                    "SHIPPER_INSTRUCTIONS",
                    &[
                        "shipper's letter of instructions",
                        "sli",
                        "shipping instructions",
                        "letter of instructions",
                        "shipper instructions",
                    ],
                )
                .with_secondary(&[
                    "freight", "model", "USPPI", "party", "parties", "related party",
                    "related parties", "sli", "id", "controls", "goods", "nordson",
                    "fed id#", "notify", "distribution", "instructions", "bill", "fed",
                    "fordwarder", "consignee", "ein", "irs", "password", "zip code",
                    "comodity", "forwarding", "indicator", "type", "export",
                ])
                .min_secondary(3)
                .priority(5),
            ],
        }
    }
}

impl Default for ProfileTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_is_valid() {
        let table = ProfileTable::builtin();
        assert!(table.validate().is_ok());
        assert_eq!(table.len(), 8);
    }

    #[test]
    fn functional_lookup() {
        let table = ProfileTable::builtin();
        assert!(table.is_functional("INVOICE"));
        assert!(table.is_functional("PACKING_SLIP"));
        assert!(!table.is_functional("CERTIFICATE_ORIGIN"));
        assert!(!table.is_functional(UNKNOWN_TYPE));
        assert!(!table.is_functional("NOT_A_TYPE"));
    }

    #[test]
    fn rejects_duplicate_names() {
        let result = ProfileTable::new(vec![
            TypeProfile::new("A", &["alpha"]),
            TypeProfile::new("A", &["beta"]),
        ]);
        assert!(matches!(result, Err(PagesortError::InvalidProfile(_))));
    }

    #[test]
    fn rejects_reserved_unknown_name() {
        let result = ProfileTable::new(vec![TypeProfile::new(UNKNOWN_TYPE, &["x"])]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_profile_without_primary_keywords() {
        let result = ProfileTable::new(vec![TypeProfile::new("EMPTY", &[])]);
        assert!(result.is_err());
    }

    #[test]
    fn json_round_trip_preserves_order() {
        let table = ProfileTable::builtin();
        let json = serde_json::to_string(&table).unwrap();
        let parsed: ProfileTable = serde_json::from_str(&json).unwrap();
        let names: Vec<_> = parsed.profiles().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names[0], "INVOICE");
        assert_eq!(names[7], "SHIPPER_INSTRUCTIONS");
    }

    #[test]
    fn load_applies_serde_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        std::fs::write(
            &path,
            r#"{ "profiles": [ { "name": "MANIFEST", "primary_keywords": ["manifest"] } ] }"#,
        )
        .unwrap();

        let table = ProfileTable::load(&path).unwrap();
        let manifest = table.get("MANIFEST").unwrap();
        assert!(!manifest.functional);
        assert_eq!(manifest.min_secondary_matches, 0);
        assert!(manifest.secondary_keywords.is_empty());
    }
}
