#[cfg(test)]
mod resolution;
