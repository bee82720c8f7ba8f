mod eastmoney;
mod exchange;
mod news;
mod tencent;

pub use eastmoney::EastMoneyAdapter;
pub use exchange::ExchangeSummaryAdapter;
pub use news::{
    BreakfastNewsAdapter, ClsNewsAdapter, FutuNewsAdapter, GlobalNewsAdapter, MarketNewsAdapter,
    SinaNewsAdapter, StockNewsAdapter, ThsNewsAdapter,
};
pub use tencent::TencentAdapter;
