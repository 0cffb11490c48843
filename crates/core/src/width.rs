use crate::number::{find_number_in_name, AnchorMode, EmbeddedNumber};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidthReport {
    pub width: usize,
    pub max_number: Option<EmbeddedNumber>,
    pub numbered: usize,
    pub skipped: usize,
}

pub fn detect_max_width<I, S>(names: I, anchor: AnchorMode) -> usize
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    detect_width(names, anchor).width
}

pub fn detect_width<I, S>(names: I, anchor: AnchorMode) -> WidthReport
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut report = WidthReport::default();

    for name in names {
        let name = name.as_ref();
        let Some(found) = find_number_in_name(name, anchor) else {
            tracing::debug!(name, "番号なし");
            report.skipped += 1;
            continue;
        };
        tracing::debug!(name, number = %found.number, "番号を検出");
        report.numbered += 1;

        if report
            .max_number
            .as_ref()
            .map_or(true, |max| found.number > *max)
        {
            report.max_number = Some(found.number);
        }
    }

    report.width = report
        .max_number
        .as_ref()
        .map_or(0, EmbeddedNumber::digit_count);

    match report.max_number.as_ref() {
        Some(max) => tracing::info!(max = %max, width = report.width, "最大番号"),
        None => tracing::info!("番号付きのエントリがありません"),
    }

    report
}
