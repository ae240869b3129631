mod price_bar;

pub use price_bar::{parse_date, BarChange, BarChanges, DateFilter, DateQuery, PriceBar, UpdateBarRequest, DATE_FORMAT};
