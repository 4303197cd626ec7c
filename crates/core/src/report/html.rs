use crate::domain::opportunity::{Opportunity, Rating, Report};
use crate::screen::classifier::{ClassifierConfig, MacdState};
use crate::time::ist;
use std::fmt::Write;

const TITLE: &str = "NIFTY 50 Swing Trade Opportunities";

const STYLE: &str = r#"
    body { font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; background-color: #f5f8fa; color: #333; line-height: 1.6; padding: 20px; }
    .container { max-width: 1000px; margin: 0 auto; background: white; border-radius: 10px; overflow: hidden; box-shadow: 0 0 20px rgba(0,0,0,0.1); }
    .header { background: linear-gradient(135deg, #1a2a6c, #b21f1f, #1a2a6c); color: white; text-align: center; padding: 25px; }
    .header h1 { margin: 0; font-size: 24px; }
    .header p { margin: 10px 0 0; opacity: 0.9; }
    .card { background: white; border-radius: 8px; box-shadow: 0 4px 8px rgba(0,0,0,0.05); margin: 20px; overflow: hidden; border-left: 4px solid #4CAF50; }
    .card-header { background-color: #f9f9f9; padding: 15px 20px; border-bottom: 1px solid #eee; display: flex; justify-content: space-between; align-items: center; }
    .stock-name { font-weight: bold; font-size: 18px; color: #1a237e; }
    .stock-rating { color: white; padding: 5px 10px; border-radius: 20px; font-size: 14px; }
    .rating-strong { background-color: #4CAF50; }
    .rating-good { background-color: #2196F3; }
    .card-body { padding: 20px; }
    .data-row { display: flex; margin-bottom: 15px; flex-wrap: wrap; }
    .data-item { flex: 1; min-width: 200px; margin-bottom: 10px; }
    .data-label { font-weight: 600; color: #666; font-size: 14px; margin-bottom: 5px; }
    .data-value { font-size: 16px; font-weight: 600; }
    .support-distance { display: inline-block; padding: 3px 8px; border-radius: 4px; background-color: #e8f5e9; color: #2e7d32; font-weight: bold; }
    .rsi-value { color: #c62828; font-weight: bold; }
    .macd-bullish { color: #388e3c; font-weight: bold; }
    .macd-neutral { color: #777; font-weight: bold; }
    .reasoning { background-color: #f1f8e9; padding: 15px; border-radius: 8px; margin-top: 15px; font-size: 14px; }
    .footer { text-align: center; padding: 20px; color: #777; font-size: 12px; border-top: 1px solid #eee; }
    .no-signals { text-align: center; padding: 40px; color: #777; }
"#;

pub fn subject_line(report: &Report) -> String {
    match report.opportunities.len() {
        0 => "NIFTY 50 Swing Trade Report: No Opportunities Found".to_string(),
        1 => format!("{TITLE}: 1 Stock Found"),
        n => format!("{TITLE}: {n} Stocks Found"),
    }
}

/// Self-contained HTML email body. Cards follow the report's opportunity order.
pub fn render_html(report: &Report, criteria: &ClassifierConfig) -> String {
    let mut html = String::with_capacity(8 * 1024 + report.opportunities.len() * 2048);

    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    html.push_str("<meta charset=\"UTF-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    let _ = writeln!(html, "<title>{TITLE}</title>");
    let _ = writeln!(html, "<style>{STYLE}</style>");
    html.push_str("</head>\n<body>\n<div class=\"container\">\n");

    let _ = write!(
        html,
        "<div class=\"header\">\n<h1>{TITLE}</h1>\n\
         <p>Stocks near key support levels with bullish indicators</p>\n<p>{}</p>\n</div>\n",
        ist::report_date(report.generated_at)
    );

    if report.opportunities.is_empty() {
        html.push_str(
            "<div class=\"no-signals\">\n\
             <h3>No Swing Trade Opportunities Found This Week</h3>\n\
             <p>No stocks currently meet the criteria for swing trading opportunities.</p>\n\
             <p>Check back next week for updated signals.</p>\n\
             </div>\n",
        );
    } else {
        for opp in &report.opportunities {
            render_card(&mut html, opp);
        }
    }

    render_footer(&mut html, report, criteria);
    html.push_str("</div>\n</body>\n</html>\n");
    html
}

fn render_card(html: &mut String, opp: &Opportunity) {
    let rating_class = match opp.rating {
        Rating::StrongBuy => "stock-rating rating-strong",
        Rating::Buy => "stock-rating rating-good",
    };
    let macd_state = MacdState::of(&opp.snapshot);
    let macd_class = match macd_state {
        MacdState::Neutral => "data-value macd-neutral",
        _ => "data-value macd-bullish",
    };

    let _ = write!(
        html,
        r#"<div class="card">
<div class="card-header">
<div class="stock-name">{ticker}</div>
<div class="{rating_class}">{rating}</div>
</div>
<div class="card-body">
<div class="data-row">
<div class="data-item"><div class="data-label">Current Price</div><div class="data-value">&#8377;{close:.2}</div></div>
<div class="data-item"><div class="data-label">Nearest Support</div><div class="data-value">{period}-EMA: &#8377;{ema:.2} <span class="support-distance">({distance:.2}% above)</span></div></div>
<div class="data-item"><div class="data-label">RSI (14-week)</div><div class="data-value rsi-value">{rsi:.2}</div></div>
</div>
<div class="data-row">
<div class="data-item"><div class="data-label">MACD</div><div class="data-value">{macd:.4}</div></div>
<div class="data-item"><div class="data-label">Signal Line</div><div class="data-value">{signal:.4}</div></div>
<div class="data-item"><div class="data-label">MACD Signal</div><div class="{macd_class}">{macd_state}</div></div>
</div>
<div class="reasoning"><strong>Trading Rationale:</strong> {rationale}</div>
</div>
</div>
"#,
        ticker = escape(&opp.ticker),
        rating = opp.rating.label(),
        close = opp.close,
        period = opp.support.ema_period,
        ema = opp.support.ema_value,
        distance = opp.support.distance_pct,
        rsi = opp.snapshot.rsi14,
        macd = opp.snapshot.macd.line,
        signal = opp.snapshot.macd.signal,
        macd_state = capitalize(macd_state.describe()),
        rationale = escape(&opp.rationale),
    );
}

fn render_footer(html: &mut String, report: &Report, criteria: &ClassifierConfig) {
    let _ = write!(
        html,
        "<div class=\"footer\">\n\
         <p><strong>Analysis Criteria:</strong> Stocks trading within {:.1}% above key weekly EMAs (50, 100, 200) \
         with RSI between {:.0} and {:.0} and/or a bullish MACD crossover</p>\n\
         <p><strong>Disclaimer:</strong> This is automated technical analysis. Fundamental factors and market \
         conditions should also be considered. Past performance is not indicative of future results.</p>\n",
        criteria.support_threshold_pct, criteria.rsi_lower, criteria.rsi_upper
    );

    let _ = writeln!(
        html,
        "<p>Scanned {} tickers, {} skipped.</p>",
        report.tickers_scanned,
        report.skipped.len()
    );
    if !report.skipped.is_empty() {
        let names: Vec<String> = report.skipped.iter().map(|s| escape(&s.ticker)).collect();
        let _ = writeln!(html, "<p>Skipped: {}</p>", names.join(", "));
    }

    let _ = write!(
        html,
        "<p>Generated on {} (run {})</p>\n</div>\n",
        ist::report_timestamp(report.generated_at),
        report.run_id
    );
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
