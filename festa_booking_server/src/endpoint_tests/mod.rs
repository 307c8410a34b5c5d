mod orders;
mod payments;
mod webhook;
