mod crypto;
mod fixtures;
mod near_proof;
