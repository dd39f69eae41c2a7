//! Date, date-time and time pickers.

use super::common::FieldCore;
use crate::driver::ScriptArg;
use crate::result::{VeoError, VeoResult};
use crate::scripts;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Format of the `shortDate` AngularJS filter for the `en` locale
pub const SHORT_DATE_FORMAT: &str = "%-m/%-d/%y";

const ISO_DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";
const MIDNIGHT: &str = "00:00:00";

/// Parse a date as displayed by a date picker input
#[must_use]
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%m/%d/%y")
        .or_else(|_| NaiveDate::parse_from_str(text, ISO_DATE_FORMAT))
        .ok()
}

/// Parse `HH:MM:SS` or `HH:MM`, ignoring milliseconds
#[must_use]
pub fn parse_time(text: &str) -> Option<NaiveTime> {
    let text = text.trim().trim_end_matches(".000");
    NaiveTime::parse_from_str(text, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .ok()
}

/// Date input holding an ISO date
#[derive(Debug, Clone)]
pub struct DateField {
    core: FieldCore,
}

impl DateField {
    #[must_use]
    pub fn new(core: FieldCore) -> Self {
        Self { core }
    }

    #[must_use]
    pub fn core(&self) -> &FieldCore {
        &self.core
    }

    /// Date text (`YYYY-MM-DD`), empty when unset
    pub async fn get_value(&self) -> VeoResult<String> {
        let input = self.core.part("input").await?;
        Ok(self.core.session().attribute(&input, "value").await?.unwrap_or_default())
    }

    pub async fn set_value(&self, date: NaiveDate) -> VeoResult<()> {
        let input = self.core.part("input").await?;
        self.core
            .session()
            .set_input_value(&input, date.format(ISO_DATE_FORMAT).to_string())
            .await
    }

    /// Set from text, rejecting anything that is not a date
    pub async fn set_text(&self, text: &str) -> VeoResult<()> {
        if text.is_empty() {
            return self.clear().await;
        }
        let date = parse_date(text).ok_or_else(|| VeoError::InvalidFieldValue {
            name: self.core.name().to_string(),
            message: format!("\"{text}\" is not a date"),
        })?;
        self.set_value(date).await
    }

    pub async fn clear(&self) -> VeoResult<()> {
        let input = self.core.part("input").await?;
        self.core.session().clear(&input).await
    }

    pub async fn is_on_error(&self) -> VeoResult<bool> {
        self.core.has_error_class().await
    }
}

/// Date picker popup plus hours and minutes inputs
#[derive(Debug, Clone)]
pub struct DateTimeField {
    core: FieldCore,
}

impl DateTimeField {
    const DATE_INPUT: &'static str = "input[uib-datepicker-popup]";
    const HOURS_INPUT: &'static str = ".hours input";
    const MINUTES_INPUT: &'static str = ".minutes input";

    #[must_use]
    pub fn new(core: FieldCore) -> Self {
        Self { core }
    }

    #[must_use]
    pub fn core(&self) -> &FieldCore {
        &self.core
    }

    async fn input_value(&self, selector: &str) -> VeoResult<String> {
        let input = self.core.part(selector).await?;
        Ok(self.core.session().attribute(&input, "value").await?.unwrap_or_default())
    }

    /// Date and time, seconds zeroed; `None` while the date is empty
    pub async fn get_value(&self) -> VeoResult<Option<NaiveDateTime>> {
        let date = self.input_value(Self::DATE_INPUT).await?;
        let hours = self.input_value(Self::HOURS_INPUT).await?;
        let minutes = self.input_value(Self::MINUTES_INPUT).await?;
        let Some(date) = parse_date(&date) else {
            return Ok(None);
        };
        let hours: u32 = hours.trim().parse().unwrap_or(0);
        let minutes: u32 = minutes.trim().parse().unwrap_or(0);
        Ok(date.and_hms_opt(hours, minutes, 0))
    }

    pub async fn set_value(&self, value: NaiveDateTime) -> VeoResult<()> {
        self.clear().await?;
        let session = self.core.session();
        let short_date = value.format(SHORT_DATE_FORMAT).to_string();
        session
            .set_input_value(&self.core.part(Self::DATE_INPUT).await?, short_date)
            .await?;
        session
            .set_input_value(&self.core.part(Self::HOURS_INPUT).await?, value.hour())
            .await?;
        session
            .set_input_value(&self.core.part(Self::MINUTES_INPUT).await?, value.minute())
            .await
    }

    pub async fn clear(&self) -> VeoResult<()> {
        let session = self.core.session();
        for selector in [Self::DATE_INPUT, Self::HOURS_INPUT, Self::MINUTES_INPUT] {
            session.clear(&self.core.part(selector).await?).await?;
        }
        Ok(())
    }

    pub async fn is_on_error(&self) -> VeoResult<bool> {
        self.core.has_error_class().await
    }
}

/// Time input bounded by its `min` and `max` attributes
#[derive(Debug, Clone)]
pub struct TimeField {
    core: FieldCore,
}

impl TimeField {
    #[must_use]
    pub fn new(core: FieldCore) -> Self {
        Self { core }
    }

    #[must_use]
    pub fn core(&self) -> &FieldCore {
        &self.core
    }

    /// `HH:MM:SS`
    pub async fn get_value(&self) -> VeoResult<String> {
        let input = self.core.part("input").await?;
        let value = self.core.session().attribute(&input, "value").await?.unwrap_or_default();
        Ok(value.replace(".000", ""))
    }

    /// Set `HH:MM:SS`; an empty value clears
    pub async fn set_value(&self, value: &str) -> VeoResult<()> {
        if value.is_empty() {
            self.write_time(MIDNIGHT).await
        } else {
            self.write_time(value).await
        }
    }

    async fn write_time(&self, value: &str) -> VeoResult<()> {
        let session = self.core.session();
        let input = self.core.part("input").await?;
        let min = session.attribute(&input, "min").await?.unwrap_or_default();
        let max = session.attribute(&input, "max").await?.unwrap_or_default();
        let invalid = |message: String| VeoError::InvalidFieldValue {
            name: self.core.name().to_string(),
            message,
        };

        let time = parse_time(value).ok_or_else(|| invalid(format!("\"{value}\" is not a time")))?;
        let above_min = parse_time(&min).map_or(true, |min| time >= min);
        let below_max = parse_time(&max).map_or(true, |max| time <= max);
        if !(above_min && below_max) {
            return Err(invalid(format!("Time must be between {min} and {max}")));
        }

        let id = session.find(&input).await?;
        session
            .execute_script(
                scripts::SET_TIME,
                vec![
                    ScriptArg::Element(id),
                    ScriptArg::Value(time.format(TIME_FORMAT).to_string().into()),
                ],
            )
            .await
            .map(|_| ())
    }

    /// Back to midnight
    pub async fn clear(&self) -> VeoResult<()> {
        self.write_time(MIDNIGHT).await
    }

    pub async fn is_on_error(&self) -> VeoResult<bool> {
        self.core.has_error_class().await
    }
}
