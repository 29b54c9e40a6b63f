// Referral attribution: `/{code}` entry points set the referral and visitor
// cookies, record the visit once per (code, visitor), and send the visitor home.

pub mod handlers;
pub mod recorder;
pub mod visitor;
