use crate::error::RankingError;

const MAX_PLAYER_NAME_LEN: usize = 32;

pub fn validate_player_name(name: &str) -> Result<String, RankingError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(RankingError::InvalidArgument("Player name cannot be empty".into()))
    } else {
        Ok(trimmed.chars().take(MAX_PLAYER_NAME_LEN).collect())
    }
}

pub fn validate_score(score: i64) -> Result<u64, RankingError> {
    u64::try_from(score).map_err(|_| RankingError::InvalidScore(score))
}

pub fn validate_limit(n: i64) -> Result<usize, RankingError> {
    if n < 0 {
        return Err(RankingError::InvalidArgument(format!(
            "Limit cannot be negative: {}",
            n
        )));
    }
    // usize may be narrower than i64 on 32-bit targets; saturate.
    Ok(usize::try_from(n).unwrap_or(usize::MAX))
}
