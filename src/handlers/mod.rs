// handlers - two security tiers
//
// Public (no auth): /, /health, /login
// Protected (bearer JWT): /patients*, /deliveries*

pub mod protected;
pub mod public;
