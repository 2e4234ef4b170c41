use chrono::NaiveDate;
use serde::Serialize;

/// Values substituted into a template.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    pub claimant_name: String,
    pub claim_description: String,
    pub claim_amount_pence: i64,
    pub claim_start_date: Option<NaiveDate>,
    pub claim_end_date: Option<NaiveDate>,
    pub claim_status: String,
    pub recipient_name: Option<String>,
    pub reviewer_name: Option<String>,
    pub review_notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rendered {
    pub subject: String,
    pub body: String,
}

/// `1234` -> `12.34`
pub fn format_pounds(pence: i64) -> String {
    let sign = if pence < 0 { "-" } else { "" };
    let abs = pence.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

fn format_date(d: Option<NaiveDate>) -> String {
    d.map(|d| d.format("%d/%m/%Y").to_string()).unwrap_or_default()
}

fn placeholders(ctx: &RenderContext) -> [(&'static str, String); 9] {
    let or_empty = |v: &Option<String>| v.clone().unwrap_or_default();
    [
        ("{{claimant_name}}", ctx.claimant_name.clone()),
        ("{{claim_description}}", ctx.claim_description.clone()),
        ("{{claim_amount}}", format_pounds(ctx.claim_amount_pence)),
        ("{{claim_start_date}}", format_date(ctx.claim_start_date)),
        ("{{claim_end_date}}", format_date(ctx.claim_end_date)),
        ("{{claim_status}}", ctx.claim_status.clone()),
        (
            "{{recipient_name}}",
            ctx.recipient_name.clone().filter(|n| !n.trim().is_empty()).unwrap_or_else(|| "there".into()),
        ),
        ("{{reviewer_name}}", or_empty(&ctx.reviewer_name)),
        ("{{review_notes}}", or_empty(&ctx.review_notes)),
    ]
}

/// One left-to-right pass; substituted values are never scanned again.
fn fill(text: &str, values: &[(&'static str, String)]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match values.iter().find(|(key, _)| tail.starts_with(key)) {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Unknown placeholders are left as they are.
pub fn render(subject: &str, body: &str, ctx: &RenderContext) -> Rendered {
    let values = placeholders(ctx);
    Rendered { subject: fill(subject, &values), body: fill(body, &values) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> RenderContext {
        RenderContext {
            claimant_name: "Ann Lee".into(),
            claim_description: "Leeds trip".into(),
            claim_amount_pence: 12_345,
            claim_start_date: NaiveDate::from_ymd_opt(2024, 3, 4),
            claim_end_date: NaiveDate::from_ymd_opt(2024, 3, 9),
            claim_status: "approved".into(),
            recipient_name: None,
            reviewer_name: Some("Raj".into()),
            review_notes: None,
        }
    }

    #[test]
    fn replaces_every_occurrence() {
        let r = render(
            "Claim {{claim_status}}: {{claim_description}}",
            "Hi {{recipient_name}}, {{claimant_name}}'s claim for £{{claim_amount}} \
             ({{claim_start_date}} to {{claim_end_date}}) was {{claim_status}} by {{reviewer_name}}.{{review_notes}}",
            &ctx(),
        );
        assert_eq!(r.subject, "Claim approved: Leeds trip");
        assert_eq!(
            r.body,
            "Hi there, Ann Lee's claim for £123.45 (04/03/2024 to 09/03/2024) was approved by Raj."
        );
    }

    #[test]
    fn unknown_placeholders_survive() {
        let r = render("{{claim_total}}", "{{recipient_name}} {{unknown}}", &RenderContext { recipient_name: Some("Jo".into()), ..ctx() });
        assert_eq!(r.subject, "{{claim_total}}");
        assert_eq!(r.body, "Jo {{unknown}}");
    }

    #[test]
    fn substituted_text_is_not_expanded_again() {
        let r = render(
            "{{claimant_name}}",
            "{{claim_description}} / {{review_notes}} / {{{claim_status}}",
            &RenderContext {
                claimant_name: "Eve {{review_notes}}".into(),
                claim_description: "{{claim_amount}}".into(),
                review_notes: Some("secret".into()),
                ..ctx()
            },
        );
        assert_eq!(r.subject, "Eve {{review_notes}}");
        assert_eq!(r.body, "{{claim_amount}} / secret / {approved");
    }

    #[test]
    fn pounds_formatting() {
        assert_eq!(format_pounds(0), "0.00");
        assert_eq!(format_pounds(5), "0.05");
        assert_eq!(format_pounds(100_000), "1000.00");
        assert_eq!(format_pounds(-250), "-2.50");
    }
}
