//! Curve Lifecycle Integration Tests
//!
//! End-to-end tests of the full engine surface:
//! 1. Create a curve and trade it through the facade
//! 2. Verify conservation after a mixed trade sequence
//! 3. Freeze once thresholds hold, launch, and verify the distribution
//! 4. Verify the durable event log captured the whole session

use std::sync::Arc;

use lib_curve::{
    CurveEngine, CurveError, CurveState, EngineConfig, Owner, SledEventLog, TradeKind,
};
use lib_types::{keys, units, AccountId, Amount, KeyAmount};

fn account(n: u8) -> AccountId {
    AccountId::new([n; 32])
}

#[tokio::test]
async fn test_full_lifecycle_with_default_thresholds() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let log = Arc::new(SledEventLog::open(temp_dir.path()).unwrap());
    let engine = CurveEngine::with_sink(EngineConfig::default(), log.clone()).unwrap();

    let owner_account = account(1);
    let curve = engine
        .create_curve(Owner::Project(owner_account))
        .await
        .unwrap();
    let id = curve.id;

    // Below thresholds: freeze must fail and leave the curve tradable.
    engine.buy(&id, account(2), keys(10), None).await.unwrap();
    let result = engine.freeze(&id, owner_account).await;
    assert!(matches!(result, Err(CurveError::ThresholdsNotMet { .. })));
    assert_eq!(
        engine.get_curve(&id).await.unwrap().state,
        CurveState::Active
    );

    // Build up past every threshold: 4 holders, >=100 keys, >=10 units.
    engine.buy(&id, account(2), keys(390), None).await.unwrap();
    engine
        .buy(&id, account(3), keys(300), Some(account(2)))
        .await
        .unwrap();
    engine.buy(&id, account(4), keys(200), None).await.unwrap();
    engine.buy(&id, account(5), keys(100), None).await.unwrap();

    let current = engine.get_curve(&id).await.unwrap();
    assert_eq!(current.supply, keys(1_000));
    assert_eq!(current.holder_count, 4);
    assert!(current.reserve >= units(10));

    // One seller takes profit; conservation must hold afterward.
    let sell = engine.sell(&id, account(3), keys(100)).await.unwrap();
    assert!(sell.payout < sell.notional);

    let current = engine.get_curve(&id).await.unwrap();
    let holders = engine.holders(&id, 100).await.unwrap();
    let held: KeyAmount = holders.iter().map(|h| h.balance).sum();
    assert_eq!(current.supply, held);

    // Freeze captures the snapshot; trading stops.
    let frozen = engine.freeze(&id, owner_account).await.unwrap();
    assert_eq!(frozen.state, CurveState::Frozen);
    assert!(matches!(
        engine.buy(&id, account(9), keys(1), None).await,
        Err(CurveError::CurveNotActive { .. })
    ));

    // Launch distributes exactly the configured supply.
    let outcome = engine.launch(&id, owner_account, 2_500).await.unwrap();
    let distributed: Amount = outcome.distributions.iter().map(|a| a.amount).sum();
    assert_eq!(distributed, engine.config().launch.distribution_supply);
    assert_eq!(outcome.distributions.len(), 4);
    assert_eq!(outcome.curve.state, CurveState::Launched);
    assert!(outcome.curve.token_mint.is_some());

    // Second launch is a guarded no-op.
    assert_eq!(
        engine.launch(&id, owner_account, 2_500).await,
        Err(CurveError::AlreadyLaunched)
    );

    // The durable log saw the whole session.
    engine.flush_sink();
    let recorded = log.events_for(&id);
    let buys = recorded
        .iter()
        .filter(|e| matches!(e.kind, TradeKind::Buy { .. }))
        .count();
    let distributions = recorded
        .iter()
        .filter(|e| e.kind == TradeKind::LaunchDistribution)
        .count();
    assert_eq!(buys, 5);
    assert_eq!(distributions, 4);
    assert_eq!(
        recorded.last().map(|e| e.kind),
        Some(TradeKind::Launch)
    );
}

#[tokio::test]
async fn test_reserve_accounting_across_many_round_trips() {
    let engine = CurveEngine::new(EngineConfig::for_testing()).unwrap();
    let curve = engine.create_curve(Owner::User(account(1))).await.unwrap();
    let id = curve.id;

    // A base position keeps the reserve comfortably positive.
    engine.buy(&id, account(2), keys(500), None).await.unwrap();
    let base = engine.get_curve(&id).await.unwrap();

    let mut expected_reserve = base.reserve;
    for round in 0..10u64 {
        let amount = keys(1 + round);
        let buy = engine.buy(&id, account(3), amount, None).await.unwrap();
        let sell = engine.sell(&id, account(3), amount).await.unwrap();

        // Same integral both directions at the same boundary.
        assert_eq!(buy.notional, sell.notional);
        expected_reserve += buy.fees.reserve;
        expected_reserve -= sell.payout;
    }

    let after = engine.get_curve(&id).await.unwrap();
    assert_eq!(after.supply, base.supply);
    assert_eq!(after.reserve, expected_reserve);

    // The round-tripping trader holds nothing but kept their P&L history.
    let pos = engine.position(&id, &account(3)).await.unwrap().unwrap();
    assert_eq!(pos.balance, 0);
    assert!(pos.realized_pnl != 0);
}

#[tokio::test]
async fn test_quotes_preview_execution_for_both_sides() {
    let engine = CurveEngine::new(EngineConfig::for_testing()).unwrap();
    let curve = engine.create_curve(Owner::User(account(1))).await.unwrap();
    let id = curve.id;

    engine.buy(&id, account(2), keys(250), None).await.unwrap();

    let quote = engine.quote_buy(&id, keys(33)).await.unwrap();
    let receipt = engine.buy(&id, account(3), keys(33), None).await.unwrap();
    assert_eq!(quote.cost, receipt.notional);
    assert_eq!(quote.fees.reserve, receipt.fees.reserve);
    assert!(quote.price_impact_bps > 0);

    let quote = engine.quote_sell(&id, keys(33)).await.unwrap();
    let receipt = engine.sell(&id, account(3), keys(33)).await.unwrap();
    assert_eq!(quote.proceeds, receipt.notional);
    assert_eq!(quote.tax, receipt.fees.tax);
    assert_eq!(quote.payout, receipt.payout);
    assert!(quote.price_impact_bps < 0);
}

#[tokio::test]
async fn test_unauthorized_lifecycle_calls_change_nothing() {
    let engine = CurveEngine::new(EngineConfig::for_testing()).unwrap();
    let curve = engine.create_curve(Owner::User(account(1))).await.unwrap();
    let id = curve.id;
    engine.buy(&id, account(2), keys(100), None).await.unwrap();

    assert_eq!(
        engine.freeze(&id, account(2)).await,
        Err(CurveError::Unauthorized)
    );

    engine.freeze(&id, account(1)).await.unwrap();
    assert_eq!(
        engine.launch(&id, account(2), 1_000).await,
        Err(CurveError::Unauthorized)
    );

    // Still frozen, still launchable by the owner.
    let outcome = engine.launch(&id, account(1), 1_000).await.unwrap();
    assert_eq!(outcome.curve.state, CurveState::Launched);
}
