use super::number_generator::NumberGenerator;

pub fn is_prime(n: i64) -> bool {
    if n <= 1 {
        return false;
    }
    if n <= 3 {
        return true;
    }
    if n % 2 == 0 || n % 3 == 0 {
        return false;
    }
    let mut i = 5;
    while i * i <= n {
        if n % i == 0 || n % (i + 2) == 0 {
            return false;
        }
        i += 6;
    }
    true
}

fn perfect_square_root(n: i64) -> Option<i64> {
    if n < 0 {
        return None;
    }
    let root = (n as f64).sqrt().round() as i64;
    (root * root == n).then_some(root)
}

fn digit_sum(n: i64) -> u32 {
    n.unsigned_abs()
        .to_string()
        .chars()
        .filter_map(|c| c.to_digit(10))
        .sum()
}

/// Every true statement the math hint can make about `number`
pub fn math_facts(number: i64) -> Vec<String> {
    let mut facts = Vec::new();
    if is_prime(number) {
        facts.push("This is a prime number".to_string());
    }
    if number % 2 == 0 {
        facts.push("This number is even".to_string());
    } else {
        facts.push("This number is odd".to_string());
    }
    for divisor in [3, 5, 10] {
        if number % divisor == 0 {
            facts.push(format!("This number is divisible by {}", divisor));
        }
    }
    if let Some(root) = perfect_square_root(number) {
        facts.push(format!("This is a square number ({} × {})", root, root));
    }
    let sum = digit_sum(number);
    if sum > 10 {
        facts.push(format!("The sum of its digits is {}", sum));
    }
    facts
}

/// One fact picked at random, or the range itself when nothing applies
pub fn math_hint(number: i64, min: i64, max: i64, generator: &mut NumberGenerator) -> String {
    let facts = math_facts(number);
    generator
        .choose(&facts)
        .cloned()
        .unwrap_or_else(|| format!("This is a number between {} and {}", min, max))
}
