pub(crate) mod health;
pub(crate) mod stock_data;
