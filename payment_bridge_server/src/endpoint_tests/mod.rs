mod helpers;
mod mocks;

mod health;
mod payments;
mod webhooks;
