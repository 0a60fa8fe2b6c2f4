// Venue names
pub const NOBITEX: &str = "nobitex";
pub const RAMZINEX: &str = "ramzinex";
pub const TABDEAL: &str = "tabdeal";

pub const VENUES: [&str; 3] = [NOBITEX, RAMZINEX, TABDEAL];

// Trading pair
pub const DEFAULT_SYMBOL: &str = "USDTIRT";

// Hypothetical capital per evaluation cycle (toman)
pub const DEFAULT_CAPITAL: i64 = 4_000_000;

// Simulated USDT held on every venue when no wallet file exists
pub const DEFAULT_SEED_BALANCE: i64 = 500;
pub const DEFAULT_WALLET_PATH: &str = "wallets.json";

// USDT amounts are kept to this many decimal places
pub const USDT_DECIMALS: u32 = 8;

// Dispatch gate
pub const DEFAULT_MIN_PROFIT_PERCENT: &str = "1.5";
pub const DEFAULT_MIN_TRADE_AMOUNT: i64 = 100;

// Fetch retry policy (seconds)
pub const FETCH_MAX_ATTEMPTS: u32 = 3;
pub const FETCH_TIMEOUT_SECS: u64 = 10;
pub const FETCH_BACKOFF_SECS: u64 = 2;

// Scheduler pacing (seconds)
pub const POLL_INTERVAL_SECS: u64 = 300;
pub const ERROR_BACKOFF_SECS: u64 = 60;

// Venue API endpoints
pub const NOBITEX_API_URL: &str = "https://api.nobitex.ir";
pub const RAMZINEX_API_URL: &str = "https://publicapi.ramzinex.com";
pub const TABDEAL_API_URL: &str = "https://api.tabdeal.org";

// Ramzinex identifies markets by numeric pair id; 32 is USDT/IRR
pub const RAMZINEX_USDT_PAIR_ID: u32 = 32;

// Fee rates (taker)
pub const NOBITEX_FEE_RATE: &str = "0.002";
pub const RAMZINEX_FEE_RATE: &str = "0.0015";
pub const TABDEAL_FEE_RATE: &str = "0.002";

// Market pages shown as signal buttons
pub const NOBITEX_MARKET_URL: &str = "https://nobitex.ir/market/USDTIRT";
pub const RAMZINEX_MARKET_URL: &str = "https://ramzinex.com/exchange/USDT-IRR";
pub const TABDEAL_MARKET_URL: &str = "https://tabdeal.org/markets/usdt-irt";
pub const LIVE_CHART_URL: &str = "https://www.tradingview.com/chart/";

pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";
