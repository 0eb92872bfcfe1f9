//! Order number generation
//!
//! 单号按营业日（配置时区）重置。堂食和外卖各自独立计数：
//! dine-in `D{桌号}-{YYYYMMDD}-{序号:03}`, takeout `TK-{YYYYMMDD}-{序号:03}`.
//! The prefixes keep the two schemes disjoint, so a printed number is
//! unambiguous even when both sequences are at the same count.

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use parking_lot::Mutex;

#[derive(Debug)]
struct DayState {
    date: NaiveDate,
    dine_in_seq: u32,
    takeout_seq: u32,
}

/// Per-day order number source for one restaurant
pub struct OrderNumberGenerator {
    tz: Tz,
    state: Mutex<DayState>,
}

impl OrderNumberGenerator {
    pub fn new(tz: Tz) -> Self {
        let today = Utc::now().with_timezone(&tz).date_naive();
        Self {
            tz,
            state: Mutex::new(DayState {
                date: today,
                dine_in_seq: 0,
                takeout_seq: 0,
            }),
        }
    }

    fn business_date(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }

    pub fn next_dine_in(&self, table_number: i32) -> String {
        self.next_dine_in_on(self.business_date(), table_number)
    }

    pub fn next_takeout(&self) -> String {
        self.next_takeout_on(self.business_date())
    }

    fn next_dine_in_on(&self, date: NaiveDate, table_number: i32) -> String {
        let mut state = self.state.lock();
        Self::roll(&mut state, date);
        state.dine_in_seq += 1;
        format!(
            "D{}-{}-{:03}",
            table_number,
            date.format("%Y%m%d"),
            state.dine_in_seq
        )
    }

    fn next_takeout_on(&self, date: NaiveDate) -> String {
        let mut state = self.state.lock();
        Self::roll(&mut state, date);
        state.takeout_seq += 1;
        format!("TK-{}-{:03}", date.format("%Y%m%d"), state.takeout_seq)
    }

    /// Reset both sequences when the business date moves
    fn roll(state: &mut DayState, date: NaiveDate) {
        if state.date != date {
            state.date = date;
            state.dine_in_seq = 0;
            state.takeout_seq = 0;
        }
    }
}
