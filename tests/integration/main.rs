//! Integration tests for the full contract pipeline.

mod mock_prices;
mod pipeline;
