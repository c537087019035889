mod helpers;
mod mocks;
mod transactions;
mod ws;
