pub(crate) mod admin;
pub(crate) mod dividends;
pub(crate) mod drip;
pub(crate) mod etfs;
pub(crate) mod health;
pub(crate) mod imports;
pub(crate) mod prices;
pub(crate) mod rankings;
