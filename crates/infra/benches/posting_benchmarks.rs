use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use corebank_core::{ActorId, BranchId, PositionId, RequestContext, RuleId};
use corebank_chart::{AccountNumberingScheme, AccountingRule, ChartPosition, EventCode};
use corebank_infra::InMemoryLedger;
use corebank_posting::{OperationKind, Party, PostingRequest, TransactionProcessor, TransactionRef};
use corebank_reporting::{BalanceAggregator, BranchScope};

fn seed_rule(ledger: &InMemoryLedger, code: &EventCode, number: &str, description: &str) {
    let position = ChartPosition::new(PositionId::new(), number, description, 1)
        .expect("valid chart position");
    let rule = AccountingRule::new(RuleId::new(), code.clone(), Some(position.id));
    ledger.insert_position(position).expect("seed position");
    ledger.insert_rule(rule).expect("seed rule");
}

fn setup() -> (
    TransactionProcessor<Arc<InMemoryLedger>>,
    Arc<InMemoryLedger>,
    RequestContext,
    EventCode,
    EventCode,
) {
    corebank_observability::init();
    let ledger = Arc::new(InMemoryLedger::new());
    let scheme = AccountNumberingScheme::new("10005", 5, 3).expect("valid scheme");

    let teller = EventCode::new("CASH", "Teller_Operating").expect("event code");
    let savings = EventCode::new("SAV001", "Principal").expect("event code");
    seed_rule(&ledger, &teller, "371050", "Teller operating cash");
    seed_rule(&ledger, &savings, "451020", "Savings deposits");

    let ctx = RequestContext::new(BranchId::new(), "00042", ActorId::new());
    let processor = TransactionProcessor::new(ledger.clone(), scheme);
    (processor, ledger, ctx, teller, savings)
}

fn deposit(teller: &EventCode, savings: &EventCode, reference: String) -> PostingRequest {
    PostingRequest::new(
        OperationKind::Deposit,
        "Benchmark deposit",
        NaiveDate::from_ymd_opt(2026, 3, 15).expect("valid date"),
        Party::Event(teller.clone()),
        Party::Event(savings.clone()),
        Decimal::ONE_HUNDRED,
        TransactionRef::new(reference).expect("valid reference"),
    )
}

fn bench_posting(c: &mut Criterion) {
    let mut group = c.benchmark_group("posting");
    group.throughput(Throughput::Elements(1));

    group.bench_function("deposit_two_entries", |b| {
        let (processor, _ledger, ctx, teller, savings) = setup();
        let mut sequence = 0u64;
        b.iter(|| {
            sequence += 1;
            let request = deposit(&teller, &savings, format!("BENCH-{sequence}"));
            processor.execute(&request, &ctx).expect("posting succeeds");
        });
    });

    group.finish();
}

fn bench_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregation");
    let from = NaiveDate::from_ymd_opt(2026, 3, 1).expect("valid date");
    let to = NaiveDate::from_ymd_opt(2026, 3, 31).expect("valid date");

    for transactions in [100u64, 1_000] {
        let (processor, ledger, ctx, teller, savings) = setup();
        for sequence in 0..transactions {
            let request = deposit(&teller, &savings, format!("BENCH-{sequence}"));
            processor.execute(&request, &ctx).expect("posting succeeds");
        }

        group.throughput(Throughput::Elements(transactions));
        group.bench_with_input(
            BenchmarkId::new("trial_balance", transactions),
            &transactions,
            |b, _| {
                let aggregator = BalanceAggregator::new(ledger.clone());
                b.iter(|| {
                    aggregator
                        .aggregate(BranchScope::All, from, to)
                        .expect("aggregation succeeds")
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_posting, bench_aggregation);
criterion_main!(benches);
