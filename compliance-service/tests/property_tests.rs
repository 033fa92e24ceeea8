//! Property-based tests for compliance tier priority
//!
//! - Rule 1 short-circuits: any amount above the threshold is Enhanced
//! - Below the threshold, pairs with no shared corridor are Strict
//! - Classification ignores trade type

use compliance_service::{ComplianceClassifier, ComplianceTier, ENHANCED_THRESHOLD};
use ledger_core::TradeType;
use proptest::prelude::*;
use reference_data::ReferenceSnapshot;
use rust_decimal::Decimal;
use std::path::PathBuf;

const COUNTRIES: [&str; 10] = ["KE", "UG", "TZ", "ZA", "BW", "NG", "GH", "EG", "MA", "US"];

fn fixture() -> ReferenceSnapshot {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../config/reference-data.toml");
    ReferenceSnapshot::from_file(path).unwrap()
}

fn country() -> impl Strategy<Value = &'static str> {
    proptest::sample::select(COUNTRIES.to_vec())
}

fn trade_type() -> impl Strategy<Value = TradeType> {
    proptest::sample::select(TradeType::ALL.to_vec())
}

proptest! {
    /// Property: amounts above the threshold are Enhanced whatever the pair
    #[test]
    fn prop_amount_rule_first(
        excess in 1i64..1_000_000_000i64,
        from in country(),
        to in country(),
        trade_type in trade_type(),
    ) {
        let snapshot = fixture();
        let classifier = ComplianceClassifier::new(snapshot.currencies(), snapshot.corridors());
        let amount = ENHANCED_THRESHOLD + Decimal::new(excess, 2);

        prop_assert_eq!(
            classifier.classify(amount, from, to, trade_type).tier,
            ComplianceTier::Enhanced
        );
    }

    /// Property: below the threshold, no shared corridor means Strict
    #[test]
    fn prop_cross_region_strict(
        cents in 0i64..10_000_000i64,
        from in country(),
        to in country(),
        trade_type in trade_type(),
    ) {
        let snapshot = fixture();
        let classifier = ComplianceClassifier::new(snapshot.currencies(), snapshot.corridors());
        let tier = classifier.classify(Decimal::new(cents, 2), from, to, trade_type).tier;

        if snapshot.corridors().share_corridor(from, to) {
            prop_assert!(tier == ComplianceTier::NetworkOptimized || tier == ComplianceTier::Basic);
        } else {
            prop_assert_eq!(tier, ComplianceTier::Strict);
        }
    }

    /// Property: trade type never changes the tier
    #[test]
    fn prop_trade_type_irrelevant(
        cents in 0i64..20_000_000_000i64,
        from in country(),
        to in country(),
    ) {
        let snapshot = fixture();
        let classifier = ComplianceClassifier::new(snapshot.currencies(), snapshot.corridors());
        let amount = Decimal::new(cents, 2);

        let baseline = classifier.classify(amount, from, to, TradeType::GoodsExport).tier;
        for trade_type in TradeType::ALL {
            prop_assert_eq!(classifier.classify(amount, from, to, trade_type).tier, baseline);
        }
    }
}

#[test]
fn test_fixture_member_pair() {
    let snapshot = fixture();
    let classifier = ComplianceClassifier::new(snapshot.currencies(), snapshot.corridors());

    // 50,000 KES is far below the threshold in reporting units
    let decision = classifier
        .classify_transfer(Decimal::from(50_000), "KES", "KE", "UG", TradeType::GoodsExport)
        .unwrap();
    assert_eq!(decision.tier, ComplianceTier::NetworkOptimized);

    // ZM's primary currency is not a member
    let decision = classifier
        .classify_transfer(Decimal::from(1_000), "ZAR", "ZA", "ZM", TradeType::GoodsExport)
        .unwrap();
    assert_eq!(decision.tier, ComplianceTier::Basic);
}
