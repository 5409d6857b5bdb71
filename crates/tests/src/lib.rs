pub mod fixtures;

#[cfg(test)]
mod workshop_tests;
#[cfg(test)]
mod join_code_tests;
#[cfg(test)]
mod gamification_tests;
