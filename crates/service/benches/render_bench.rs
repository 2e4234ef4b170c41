use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use service::notify::template::{render, RenderContext};

const BODY: &str = "Hi {{recipient_name}},\n\n{{claimant_name}} submitted \"{{claim_description}}\" \
for £{{claim_amount}} covering {{claim_start_date}} to {{claim_end_date}}.\n\
Status: {{claim_status}}. Reviewer: {{reviewer_name}}. Notes: {{review_notes}}\n";

fn bench_render(c: &mut Criterion) {
    let ctx = RenderContext {
        claimant_name: "Ann Lee".into(),
        claim_description: "Client workshop, Leeds".into(),
        claim_amount_pence: 18_734,
        claim_start_date: NaiveDate::from_ymd_opt(2024, 3, 4),
        claim_end_date: NaiveDate::from_ymd_opt(2024, 3, 8),
        claim_status: "approved".into(),
        recipient_name: Some("Raj".into()),
        reviewer_name: Some("Ada".into()),
        review_notes: Some("Receipts attached".into()),
    };
    c.bench_function("render_claim_template", |b| {
        b.iter(|| render(black_box("Claim {{claim_status}}: {{claim_description}}"), black_box(BODY), &ctx));
    });
}

criterion_group!(benches, bench_render);
criterion_main!(benches);
