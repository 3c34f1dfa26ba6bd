//! Rating aggregation

/// Mean of the ratings, floored to one decimal place; 0 when there are none.
///
/// Computed on integers (`floor(sum * 10 / n) / 10`) so results like 4.3 are
/// not disturbed by float rounding.
pub fn book_rating(ratings: &[i64]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }

    let sum: i64 = ratings.iter().sum();
    let tenths = (sum * 10).div_euclid(ratings.len() as i64);

    tenths as f64 / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_reviews_is_zero() {
        assert_eq!(book_rating(&[]), 0.0);
    }

    #[test]
    fn test_exact_mean() {
        assert_eq!(book_rating(&[5, 3]), 4.0);
        assert_eq!(book_rating(&[1]), 1.0);
        assert_eq!(book_rating(&[5, 5, 5, 5]), 5.0);
    }

    #[test]
    fn test_mean_is_floored_to_one_decimal() {
        assert_eq!(book_rating(&[5, 4, 4]), 4.3);
        assert_eq!(book_rating(&[5, 5, 4]), 4.6);
        assert_eq!(book_rating(&[1, 2]), 1.5);
        assert_eq!(book_rating(&[2, 2, 1]), 1.6);
    }
}
